mod branch;
mod catalog;
mod ledger;
mod member;
mod payment;
mod purchase;
mod staff;
mod subscription;
mod tenant;

pub use branch::*;
pub use catalog::*;
pub use ledger::*;
pub use member::*;
pub use payment::*;
pub use purchase::*;
pub use staff::*;
pub use subscription::*;
pub use tenant::*;
