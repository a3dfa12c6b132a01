pub mod chat;
pub mod memo;
pub mod model;
pub mod preference;
pub mod session;

pub use chat::{ChatMessage, MessageRole};
pub use memo::Memo;
pub use model::{AiModel, ModelPricing};
pub use preference::UserPreference;
pub use session::{ChatSession, SessionWithModel};
