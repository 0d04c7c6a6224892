pub mod expense;
pub mod group;
pub mod session;
pub mod user;

pub use expense::{
    Category, Expense, ExpenseType, ExpenseUpdate, ExpenseView, Split, SplitSpec, SplitType, SplitView,
};
pub use group::{Group, GroupMember, Role};
pub use session::{Session, SessionExpense, SessionSummary};
pub use user::User;
