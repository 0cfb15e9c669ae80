pub mod category;
pub mod expense;
pub mod subscription;
pub mod user;

pub use category::{Category, NewCategory};
pub use expense::{AmountMode, Expense, NewExpense};
pub use subscription::{NewSubscription, Subscription};
pub use user::{NewUser, User};
