pub mod collaborator;
pub mod coverage;
pub mod extractor;
pub mod feedback_gen;
pub mod question_gen;
pub mod scoring;
pub mod summary_gen;
pub mod translation_overlay;
pub mod translator;

pub use collaborator::{FeedbackGenerator, QuestionGenerator, SummaryGenerator, Translator};
pub use coverage::CoverageScheduler;
pub use extractor::{ExtractMode, ResponseExtractor};
pub use feedback_gen::LlmFeedbackGenerator;
pub use question_gen::LlmQuestionGenerator;
pub use scoring::ScoreAggregator;
pub use summary_gen::LlmSummaryGenerator;
pub use translation_overlay::TranslationOverlay;
pub use translator::LlmTranslator;
