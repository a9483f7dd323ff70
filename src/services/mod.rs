//! 面向调用方的业务服务：账号、画像、选校、待办、仪表盘、申请指导、检索与推荐
//!
//! 所有函数接收 `&dyn CounsellorStore`，按用户隔离数据；资源不存在或不属于该用户时返回 NotFound。

pub mod accounts;
pub mod applications;
pub mod dashboard;
pub mod profile;
pub mod recommendations;
pub mod shortlist;
pub mod todos;

pub use accounts::{find_by_email, signup};
pub use applications::{application_guidance, ApplicationGuidance};
pub use dashboard::{load_dashboard, Dashboard, ProfileStrength, ProfileSummary};
pub use profile::{complete_onboarding, get_profile, update_profile};
pub use recommendations::{category_for, recommend, search_universities, Recommendations};
pub use shortlist::{add_to_shortlist, list_shortlist, remove_from_shortlist, set_lock, LockOutcome};
pub use todos::{create_todo, delete_todo, list_todos, update_todo};
