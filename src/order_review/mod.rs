//! Order-review page glue.
//!
//! The server owns every business rule; this module validates the shipping
//! form, issues endpoint requests and rewrites the page from JSON replies.

pub mod actions;
pub mod client;
pub mod figures;
pub mod form;
pub mod page;
pub mod reply;
pub mod rows;

pub use actions::ReviewAction;
pub use client::{Endpoint, FormData, Method, Transport};
pub use figures::{get_total, Breakdown, PackageType, ProductPart, RowFigures, UpdateColumn};
pub use form::{FieldProblem, ShippingFields};
pub use page::{
    NotificationContacts, OrderContext, OrderReview, ReplyOutcome, Request, RequestId,
    RELOAD_DELAY, WAREHOUSE_SOURCE,
};
pub use reply::{Reply, ReplyKind, ReviewError};
