use crate::depot::{Depot, PlanBook};
use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;
use event_listener::Event;
use futures_lite::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const DEPOT_PATH: &str = "muttom.depot.toml";
pub const PLANS_PATH: &str = "muttom.plans.toml";

/// Counts outstanding depot files; the last [`LoadTicket`] to drop wakes up everyone waiting.
#[derive(Debug)]
struct Pending {
    outstanding: AtomicU32,
    done: Event,
}

#[derive(Debug, Resource)]
struct LoadBarrier(Arc<Pending>);

/// Held by the asset server for as long as a file is loading.
#[derive(Debug)]
struct LoadTicket(Arc<Pending>);

#[derive(Debug, Resource)]
struct LoadFinished(Arc<AtomicBool>);

impl LoadBarrier {
    fn new() -> (LoadBarrier, LoadTicket) {
        let pending = Arc::new(Pending {
            outstanding: AtomicU32::new(1),
            done: Event::new(),
        });
        (LoadBarrier(pending.clone()), LoadTicket(pending))
    }

    fn finished(&self) -> impl Future<Output = ()> + 'static {
        let pending = self.0.clone();
        async move {
            loop {
                let listener = pending.done.listen();
                if pending.outstanding.load(Ordering::Acquire) == 0 {
                    break;
                }
                listener.await;
            }
        }
    }
}

impl Clone for LoadTicket {
    fn clone(&self) -> Self {
        self.0.outstanding.fetch_add(1, Ordering::AcqRel);
        LoadTicket(self.0.clone())
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        if self.0.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.done.notify(usize::MAX);
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, States)]
pub enum LoadingState {
    #[default]
    Loading,
    Loaded,
}

#[derive(Resource)]
pub struct AssetHandles {
    pub depot: Handle<Depot>,
    pub plans: Handle<PlanBook>,
}

pub struct AssetLoadingPlugin;

impl Plugin for AssetLoadingPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<LoadingState>()
            .add_systems(Startup, start_loading)
            .add_systems(Update, poll_loading.run_if(in_state(LoadingState::Loading)));
    }
}

fn start_loading(mut commands: Commands, asset_server: Res<AssetServer>) {
    let (barrier, ticket) = LoadBarrier::new();
    commands.insert_resource(AssetHandles {
        depot: asset_server.load_acquire(DEPOT_PATH, ticket.clone()),
        plans: asset_server.load_acquire(PLANS_PATH, ticket.clone()),
    });
    drop(ticket);

    let finished = barrier.finished();
    commands.insert_resource(barrier);

    let flag = Arc::new(AtomicBool::new(false));
    commands.insert_resource(LoadFinished(flag.clone()));
    AsyncComputeTaskPool::get()
        .spawn(async move {
            finished.await;
            flag.store(true, Ordering::Release);
        })
        .detach();

    info!("Loading depot {} and plans {}", DEPOT_PATH, PLANS_PATH);
}

fn poll_loading(
    finished: Res<LoadFinished>,
    handles: Res<AssetHandles>,
    asset_server: Res<AssetServer>,
    mut next_state: ResMut<NextState<LoadingState>>,
) {
    if !finished.0.load(Ordering::Acquire) {
        return;
    }
    for (path, id) in [(DEPOT_PATH, handles.depot.id().untyped()), (PLANS_PATH, handles.plans.id().untyped())] {
        if let Some(bevy::asset::LoadState::Failed(err)) = asset_server.get_load_state(id) {
            error!("Failed to load {}: {}", path, err);
        }
    }
    info!("Depot files loaded");
    next_state.set(LoadingState::Loaded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future;

    #[test]
    fn test_barrier_waits_for_every_ticket() {
        let (barrier, ticket) = LoadBarrier::new();
        let second = ticket.clone();
        assert_eq!(barrier.0.outstanding.load(Ordering::Acquire), 2);

        drop(ticket);
        let mut finished = Box::pin(barrier.finished());
        assert!(future::block_on(future::poll_once(&mut finished)).is_none());

        drop(second);
        future::block_on(finished);
        assert_eq!(barrier.0.outstanding.load(Ordering::Acquire), 0);
    }
}
