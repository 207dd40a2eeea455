use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Base URL of this API (used in logs and outbound links)
    pub base_url: String,
    /// URL of the dashboard frontend (login redirects point here)
    pub app_url: String,
    /// Stripe secret key for checkout-session retrieval; provisioning is
    /// disabled when unset
    pub stripe_secret_key: Option<String>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("REBOOK_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8787);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "rebook.db".to_string()),
            base_url,
            app_url,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok().filter(|k| !k.is_empty()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
