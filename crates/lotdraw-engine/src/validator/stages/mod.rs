pub mod assignment;
pub mod eligibility;
pub mod lot;
pub mod order;
pub mod quota;

pub use assignment::AssignmentStage;
pub use eligibility::EligibilityStage;
pub use lot::LotStage;
pub use order::OrderNumberStage;
pub use quota::QuotaStage;
