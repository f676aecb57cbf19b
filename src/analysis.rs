use crate::core::analysis::{AiAnalysis, PortfolioData, normalize_analysis};
use crate::core::completion::{ChatMessage, CompletionProvider, CompletionRequest};
use crate::core::prompt::{SYSTEM_PROMPT, build_analysis_prompt};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

pub struct AnalysisService {
    completion: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl AnalysisService {
    pub fn new(completion: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self {
            completion,
            timeout,
        }
    }

    /// Asks the model for an analysis of `data`. Falls back to
    /// [`AiAnalysis::default`] when the model fails, overruns the timeout or
    /// answers with something that is not JSON.
    #[instrument(name = "PortfolioAnalysis", skip_all, fields(assets = data.assets.len()))]
    pub async fn analyze_portfolio(&self, data: &PortfolioData) -> AiAnalysis {
        match self.request_analysis(data).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Portfolio analysis failed, using default analysis");
                AiAnalysis::default()
            }
        }
    }

    async fn request_analysis(&self, data: &PortfolioData) -> Result<AiAnalysis> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_analysis_prompt(data)),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let content = tokio::time::timeout(self.timeout, self.completion.complete(&request))
            .await
            .map_err(|_| anyhow!("Model call timed out after {:?}", self.timeout))??;
        debug!(length = content.len(), "Received analysis from model");

        match serde_json::from_str(strip_code_fence(&content)) {
            Ok(raw) => Ok(normalize_analysis(&raw)),
            Err(e) => {
                warn!(error = %e, "Model answer is not valid JSON");
                Ok(AiAnalysis::default())
            }
        }
    }
}

/// Models often wrap JSON answers in a markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::{Level, PortfolioAsset};
    use crate::core::completion::Role;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubCompletion {
        answer: Option<String>,
        delay: Duration,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl StubCompletion {
        fn answering(answer: Option<&str>) -> Arc<Self> {
            Self::answering_after(answer, Duration::ZERO)
        }

        fn answering_after(answer: Option<&str>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(str::to_string),
                delay,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    fn service(stub: Arc<StubCompletion>) -> AnalysisService {
        AnalysisService::new(stub, Duration::from_millis(50))
    }

    #[async_trait]
    impl CompletionProvider for StubCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => bail!("service unavailable"),
            }
        }
    }

    fn portfolio() -> PortfolioData {
        PortfolioData {
            total_value: 2000.0,
            invested_value: 1600.0,
            assets: vec![PortfolioAsset {
                ticker: "YPFD".to_string(),
                name: "YPF".to_string(),
                sector: "Energía".to_string(),
                asset_type: "ACCION".to_string(),
                quantity: 100.0,
                current_price: 20.0,
                avg_price: 16.0,
                daily_change: 4.7,
            }],
        }
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_analysis_request_shape() {
        let stub = StubCompletion::answering(Some("{}"));
        let service = service(stub.clone());

        service.analyze_portfolio(&portfolio()).await;

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].max_tokens, 2000);
        assert_eq!(seen[0].messages[0].role, Role::System);
        assert_eq!(seen[0].messages[1].role, Role::User);
        assert!(seen[0].messages[1].content.contains("- YPFD (YPF): 25.00%"));
    }

    #[tokio::test]
    async fn test_model_answer_is_normalized() {
        let answer = r#"```json
{
  "portfolioHealth": {"score": 91, "riskLevel": "Alto"},
  "recommendations": [
    {"priority": "high", "title": "Cobertura", "description": "Dolarizar", "expectedImpact": "Menor riesgo", "timeframe": "1 mes"}
  ]
}
```"#;
        let service = service(StubCompletion::answering(Some(answer)));

        let analysis = service.analyze_portfolio(&portfolio()).await;
        assert_eq!(analysis.portfolio_health.score, 91.0);
        assert_eq!(analysis.portfolio_health.risk_level, "Alto");
        assert_eq!(analysis.portfolio_health.diversification, 70.0);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.recommendations[0].priority, Level::High);
    }

    #[tokio::test]
    async fn test_non_json_answer_yields_default() {
        let service = service(StubCompletion::answering(Some(
            "Tu portfolio se ve bien, seguí así.",
        )));
        assert_eq!(
            service.analyze_portfolio(&portfolio()).await,
            AiAnalysis::default()
        );
    }

    #[tokio::test]
    async fn test_provider_error_yields_default() {
        let service = service(StubCompletion::answering(None));
        assert_eq!(
            service.analyze_portfolio(&portfolio()).await,
            AiAnalysis::default()
        );
    }

    #[tokio::test]
    async fn test_slow_model_yields_default() {
        let stub = StubCompletion::answering_after(
            Some(r#"{"portfolioHealth": {"score": 91}}"#),
            Duration::from_secs(30),
        );

        let started = std::time::Instant::now();
        let analysis = service(stub).analyze_portfolio(&portfolio()).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(analysis, AiAnalysis::default());
    }
}
