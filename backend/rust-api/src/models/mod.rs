pub mod assessment;
pub mod candidate;
pub mod hr;
pub mod question;
