// Offer letter workflow: salary breakdown, draft prefill + validation,
// template profile resolution, and the form → preview → success session.

pub mod draft;
pub mod handlers;
pub mod salary;
pub mod session;
pub mod template;
