pub use super::activity::Entity as Activity;
pub use super::ad::Entity as Ad;
pub use super::group::Entity as Group;
pub use super::group_member::Entity as GroupMember;
pub use super::invite::Entity as Invite;
pub use super::offer::Entity as Offer;
pub use super::report::Entity as Report;
pub use super::sale::Entity as Sale;
pub use super::user::Entity as User;
