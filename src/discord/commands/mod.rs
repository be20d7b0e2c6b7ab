mod force_reset;
mod leaderboard;
mod link;
mod remove;
mod unlink;

pub use force_reset::force_reset;
pub use leaderboard::leaderboard;
pub use link::link;
pub use remove::remove;
pub use unlink::unlink;

use crate::discord::bot::Context;
use crate::tracking::Privilege;

/// Administrator permission of the invoking member in the current channel.
fn caller_privilege(ctx: Context<'_>) -> Privilege {
    let is_admin = match ctx {
        poise::Context::Application(app) => app
            .interaction
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|permissions| permissions.administrator()),
        _ => false,
    };

    if is_admin {
        Privilege::Administrator
    } else {
        Privilege::Member
    }
}
