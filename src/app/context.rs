use crate::domain::model::AppConfig;
use crate::ports::{clock::Clock, gateway::Gateway, store::Store};

/// Everything one invocation needs: configuration, the primary store, the
/// optional mirror, the API gateway, and the clock. Built once in `main`,
/// dropped when the run ends.
pub struct RunContext<S, M, G, C>
where
    S: Store,
    M: Store,
    G: Gateway,
    C: Clock,
{
    pub cfg: AppConfig,
    pub primary: S,
    pub mirror: Option<M>,
    pub gateway: G,
    pub clock: C,
}
