use clap::Args;

/// Server settings, read from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub addr: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Browser origin allowed to open a socket (repeatable; none means any)
    #[arg(long = "allow-origin", env = "STRIKEBALL_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Answer malformed guesses with an error instead of scoring them
    #[arg(long)]
    pub strict_guesses: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Loopback on an ephemeral port.
    pub fn local_ephemeral() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: Vec::new(),
            strict_guesses: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 10000,
            allowed_origins: Vec::new(),
            strict_guesses: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn parses_repeated_and_comma_separated_origins() {
        let parsed = Harness::parse_from([
            "test",
            "--port",
            "4000",
            "--allow-origin",
            "https://a.example,https://b.example",
            "--allow-origin",
            "https://c.example",
            "--strict-guesses",
        ]);
        assert_eq!(parsed.config.bind_addr(), "0.0.0.0:4000");
        assert_eq!(parsed.config.allowed_origins.len(), 3);
        assert!(parsed.config.strict_guesses);
    }
}
