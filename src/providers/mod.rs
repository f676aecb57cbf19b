pub mod chat_completion;
pub mod disabled;
pub mod web_search;

pub use chat_completion::ChatCompletionProvider;
pub use disabled::DisabledProvider;
pub use web_search::WebSearchProvider;
