//! Bulletin pipeline: validate, fetch weather, render prompt, generate, write

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument};

use crate::Result;
use crate::generation::TextGenerator;
use crate::prompt::{BulletinRequest, build_prompt};
use crate::report::write_report;
use crate::weather::WeatherApiClient;

#[derive(Clone)]
pub struct BulletinService {
    weather: WeatherApiClient,
    generator: Arc<dyn TextGenerator>,
}

impl BulletinService {
    pub fn new(weather: WeatherApiClient, generator: Arc<dyn TextGenerator>) -> Self {
        Self { weather, generator }
    }

    #[must_use]
    pub fn weather(&self) -> &WeatherApiClient {
        &self.weather
    }

    /// Produce the bulletin for `request` and write it to `output`.
    ///
    /// Weather and generation errors are returned unchanged; nothing is
    /// written unless generation succeeds.
    #[instrument(skip(self, request), fields(kind = request.kind(), city = request.city()))]
    pub async fn generate(&self, request: &BulletinRequest, output: &Path) -> Result<PathBuf> {
        request.validate()?;

        let sample = self.weather.bulletin_sample(request.city()).await?;
        let prompt = build_prompt(request, &sample)?;
        let html = self.generator.generate(&prompt).await?;

        let written = write_report(output, &html).await?;
        info!("{} bulletin for '{}' written", request.kind(), request.city());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherConfig;
    use crate::prompt::CitizenRequest;
    use crate::weather::weatherapi::fixtures::forecast_json;
    use crate::CityScienceError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("<html><body>bulletin</body></html>".to_string())
        }
    }

    async fn weather_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(3, 24, false)))
            .mount(&server)
            .await;
        server
    }

    fn request(city: &str) -> BulletinRequest {
        BulletinRequest::Citizen(CitizenRequest {
            city: city.to_string(),
            question: "Will it rain?".to_string(),
            observations: Some("Near the beach".to_string()),
        })
    }

    fn service(server: &MockServer, generator: Arc<RecordingGenerator>) -> BulletinService {
        let config = WeatherConfig {
            base_url: server.uri(),
            ..WeatherConfig::default()
        };
        BulletinService::new(WeatherApiClient::new(&config, "k").unwrap(), generator)
    }

    #[tokio::test]
    async fn test_generate_writes_generated_text_verbatim() {
        let server = weather_server().await;
        let generator = Arc::new(RecordingGenerator::default());
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("bulletin.html");

        service(&server, generator.clone())
            .generate(&request("Fortaleza"), &output)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "<html><body>bulletin</body></html>"
        );
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Observations: Near the beach"));
        assert!(prompts[0].contains("- Average Temperatures: [25.0,26.0,27.0,20.0"));
    }

    #[tokio::test]
    async fn test_invalid_request_skips_network() {
        let server = MockServer::start().await;
        let generator = Arc::new(RecordingGenerator::default());
        let dir = tempfile::tempdir().unwrap();

        let err = service(&server, generator.clone())
            .generate(&request("  "), &dir.path().join("b.html"))
            .await
            .unwrap_err();

        assert!(matches!(err, CityScienceError::Validation { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}
