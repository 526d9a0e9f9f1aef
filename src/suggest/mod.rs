//! Reasoning-agent suggestion boundary

mod json;
mod provider;

pub use json::JsonSuggestionProvider;
pub use provider::{
    FixedSuggestionProvider, RatingOverrides, Suggestion, SuggestionContext, SuggestionError,
    SuggestionProvider, SuggestionStage, UnavailableProvider,
};
