mod server;

pub use server::{
    CONFIG_FILE_NAME, DB_FILE_NAME, GatewayConfig, GatewayProvider, JobsConfig, MailConfig,
    STRIPE_SECRET_ENV, ServerConfig,
};
