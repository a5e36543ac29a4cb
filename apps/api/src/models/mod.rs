pub mod posting;
pub mod profile;

pub use posting::{Posting, RawPosting, Salary};
pub use profile::{AggregationRequest, CandidateProfile, SearchCriteria};
