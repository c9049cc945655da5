pub mod sms_challenge;
pub mod phone_verification;
pub mod vote;
pub mod ballot_link;
pub mod candidate;
pub mod phone_suppression;
pub mod rate_limit_counter;

pub use sms_challenge::Entity as SmsChallenge;
pub use phone_verification::Entity as PhoneVerification;
pub use vote::Entity as Vote;
pub use ballot_link::Entity as BallotLink;
pub use candidate::Entity as Candidate;
pub use phone_suppression::Entity as PhoneSuppression;
pub use rate_limit_counter::Entity as RateLimitCounter;
