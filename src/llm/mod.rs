pub mod anthropic_provider;
pub mod groq_provider;
pub mod http;
pub mod huggingface_provider;
pub mod mock_provider;
pub mod openai_provider;
pub mod palm_provider;
pub mod provider;
pub mod types;

pub use anthropic_provider::AnthropicProvider;
pub use groq_provider::GroqProvider;
pub use huggingface_provider::HuggingFaceProvider;
pub use mock_provider::{MOCK_ANALYSIS_PREFIX, MockProvider};
pub use openai_provider::OpenAIProvider;
pub use palm_provider::PaLMProvider;
pub use provider::{AnalysisProvider, ProviderFactory, ProviderRegistry};
pub use types::*;
