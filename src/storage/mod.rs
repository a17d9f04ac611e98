mod store;

pub use store::FeedbackStorage;
