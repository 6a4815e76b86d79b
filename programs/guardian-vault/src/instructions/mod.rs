pub mod add_adapter;
pub mod become_guardian;
pub mod configure_vault;
pub mod deposit;
pub mod initialize_registry;
pub mod open_vault;
pub mod quit_guardian;
pub mod rebalance;
pub mod redeem;
pub mod set_allocation;
pub mod set_not_active;
pub mod sweep_excess_token;
pub mod update_guardian_and_dao_cut;
pub mod update_guardian_stake_price;
pub mod withdraw;

pub use add_adapter::*;
pub use become_guardian::*;
pub use configure_vault::*;
pub use deposit::*;
pub use initialize_registry::*;
pub use open_vault::*;
pub use quit_guardian::*;
pub use rebalance::*;
pub use set_allocation::*;
pub use set_not_active::*;
pub use sweep_excess_token::*;
pub use update_guardian_stake_price::*;
pub use withdraw::*;
