#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::Cli;
    use crate::breakdown::ExtractionMode;
    use crate::config::{AppConfig, FileConfig, Provider};
    use crate::llm::client_from_config;

    #[test]
    fn cli_parses_value_enums() {
        let cli = Cli::parse_from([
            "idea-breakdown",
            "--provider",
            "openai",
            "--extraction",
            "greedy",
            "--listen",
            "0.0.0.0:8080",
            "--log-json",
        ]);
        assert_eq!(cli.provider, Some(Provider::OpenAi));
        assert_eq!(cli.extraction, Some(ExtractionMode::Greedy));
        assert_eq!(cli.listen.as_deref(), Some("0.0.0.0:8080"));
        assert!(cli.log_json);
    }

    #[test]
    fn cli_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["idea-breakdown", "--provider", "llama"]).is_err());
    }

    #[test]
    fn client_requires_api_key() {
        let cli = Cli::parse_from(["idea-breakdown"]);
        let cfg = AppConfig::resolve(&cli, FileConfig::default(), |_| None).unwrap();
        assert!(client_from_config(&cfg).is_err());
    }

    #[test]
    fn client_uses_configured_model() {
        let cli = Cli::parse_from(["idea-breakdown", "--api-key", "k", "--model", "gemini-x"]);
        let cfg = AppConfig::resolve(&cli, FileConfig::default(), |_| None).unwrap();
        let client = client_from_config(&cfg).unwrap();
        assert_eq!(client.model(), "gemini-x");

        let cli = Cli::parse_from(["idea-breakdown", "--api-key", "k", "--provider", "openai"]);
        let cfg = AppConfig::resolve(&cli, FileConfig::default(), |_| None).unwrap();
        assert_eq!(client_from_config(&cfg).unwrap().model(), "gpt-4o-mini");
    }
}
