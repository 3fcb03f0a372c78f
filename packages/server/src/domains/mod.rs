// Domain modules, leaf-first: accounts (ledger storage), rewards and admin
// (business rules), bot (routing glue).

pub mod accounts;
pub mod admin;
pub mod bot;
pub mod rewards;
