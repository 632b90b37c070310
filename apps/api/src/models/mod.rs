pub mod candidate;
pub mod company;
pub mod offer_letter;
pub mod response;
pub mod template_profile;
