pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Config {
        pub database_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_max_connections")]
        pub max_connections: u32,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::load(config::Environment::default())
        }

        fn load(environment: config::Environment) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment.try_parsing(true))
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_max_connections() -> u32 {
        crate::store::DEFAULT_MAX_CONNECTIONS
    }

}
pub mod client;
pub mod entities;
pub mod store;
pub mod task;
pub mod web;
