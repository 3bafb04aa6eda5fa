mod email_address;
mod payment_method;
mod person_name;
mod role;
mod subscription_status;

pub use email_address::EmailAddress;
pub use payment_method::PaymentMethod;
pub use person_name::PersonName;
pub use role::{Gender, Role};
pub use subscription_status::SubscriptionStatus;
