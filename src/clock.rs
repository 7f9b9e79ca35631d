use bevy::prelude::*;
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use std::time::Duration;

/// Depot wall clock, advanced by virtual time so that it follows playback speed and pauses.
#[derive(Resource)]
pub struct DepotClock {
    start_point: NaiveDateTime,
    elapsed: Duration,
}

impl Default for DepotClock {
    fn default() -> Self {
        DepotClock::new(None)
    }
}

impl DepotClock {
    /// Starts at `start_point`, or at today's midnight.
    pub fn new(start_point: Option<NaiveDateTime>) -> Self {
        let default = Local::now().date_naive().and_time(NaiveTime::default());
        DepotClock {
            start_point: start_point.unwrap_or(default),
            elapsed: Duration::ZERO,
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn current(&self) -> NaiveDateTime {
        let delta = TimeDelta::from_std(self.elapsed).unwrap_or(TimeDelta::MAX);
        self.start_point.checked_add_signed(delta).unwrap_or(NaiveDateTime::MAX)
    }

    pub fn formatted(&self) -> String {
        self.current().format("%H:%M:%S").to_string()
    }
}

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DepotClock>().add_systems(PreUpdate, tick_clock);
    }
}

fn tick_clock(time: Res<Time<Virtual>>, mut clock: ResMut<DepotClock>) {
    clock.tick(time.delta());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(5, 0, 0).unwrap();
        let mut clock = DepotClock::new(Some(start));
        assert_eq!(clock.formatted(), "05:00:00");

        clock.tick(Duration::from_millis(1500));
        clock.tick(Duration::from_millis(500));
        assert_eq!(clock.current(), start + TimeDelta::seconds(2));
        clock.tick(Duration::from_secs(3600));
        assert_eq!(clock.formatted(), "06:00:02");
    }
}
