pub mod billing;
pub mod category_tree;
