use chrono::{DateTime, Duration, Utc};

/// Minutes per day.
pub const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2440587.5;

/// Returns the fractional Julian day (UTC) of the given timestamp.
pub fn julian_date(time: &DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / (MINUTES_PER_DAY * 60.0 * 1e6) + UNIX_EPOCH_JD
}

/// Returns the minutes elapsed from the Julian day `epoch_jd` to `time`.
pub fn minutes_since(epoch_jd: f64, time: &DateTime<Utc>) -> f64 {
    (julian_date(time) - epoch_jd) * MINUTES_PER_DAY
}

/// Calculates the Greenwich Mean Sidereal Time (GMST) in radians.
pub fn gmst(time: &DateTime<Utc>) -> f64 {
    gmst_from_jd(julian_date(time))
}

/// Calculates the Greenwich Mean Sidereal Time (GMST) in radians.
///
/// # Arguments
///
/// * `jd` - The Julian days in UT
///
/// # Returns
///
/// The GMST in radians, normalized to [0, 2π].
pub fn gmst_from_jd(jd: f64) -> f64 {
    const J2000_EPOCH: f64 = 2451545.0; // Julian Date for J2000.0 epoch
    const JULIAN_CENTURY: f64 = 36525.0; // Days in a Julian century

    // GMST formula coefficients (in degrees)
    const GMST_MEAN: f64 = 280.46061837;
    const GMST_ADVANCE: f64 = 360.98564736629;
    const T2_COEFF: f64 = 0.000387933;
    const T3_COEFF: f64 = -1.0 / 38710000.0;

    // Calculate time in Julian centuries since J2000.0
    let t = (jd - J2000_EPOCH) / JULIAN_CENTURY;

    // Calculate GMST in degrees
    let gmst =
        GMST_MEAN + GMST_ADVANCE * (jd - J2000_EPOCH) + T2_COEFF * t.powi(2) + T3_COEFF * t.powi(3);

    // Convert to radians and normalize to [0, 2π]
    gmst.rem_euclid(360.0).to_radians()
}

/// Simulation clock.
///
/// Simulation time is wall-clock time shifted by an offset. While paused the
/// clock holds the instant it was paused at; resuming continues from that
/// instant rather than jumping to the wall clock.
#[derive(Clone, Debug, Default)]
pub struct SimulationClock {
    /// Time offset from the current UTC time for time simulation.
    time_offset: Duration,
    /// Simulation time frozen by a pause.
    paused_at: Option<DateTime<Utc>>,
}

impl SimulationClock {
    /// Returns the simulation time for the given wall-clock time.
    pub fn time(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        self.paused_at.unwrap_or(wall + self.time_offset)
    }

    /// Returns whether the clock is advancing.
    pub fn is_playing(&self) -> bool {
        self.paused_at.is_none()
    }

    /// Freezes simulation time.
    pub fn pause(&mut self, wall: DateTime<Utc>) {
        self.freeze_at(wall + self.time_offset);
    }

    /// Freezes simulation time at `at`, typically the time of the last
    /// propagation pass.
    pub fn freeze_at(&mut self, at: DateTime<Utc>) {
        if self.paused_at.is_none() {
            self.paused_at = Some(at);
        }
    }

    /// Resumes simulation time from the instant it was paused at.
    pub fn resume(&mut self, wall: DateTime<Utc>) {
        if let Some(frozen) = self.paused_at.take() {
            self.time_offset = frozen - wall;
        }
    }

    /// Returns the time offset.
    pub fn time_offset(&self) -> Duration {
        self.time_offset
    }

    /// Advances the simulation time.
    pub fn advance_time(&mut self, delta: Duration) {
        self.time_offset += delta;
        if let Some(frozen) = &mut self.paused_at {
            *frozen += delta;
        }
    }

    /// Rewinds the simulation time.
    pub fn rewind_time(&mut self, delta: Duration) {
        self.advance_time(-delta);
    }

    /// Resets simulation time to the wall clock.
    pub fn reset(&mut self, wall: DateTime<Utc>) {
        self.time_offset = Duration::zero();
        if self.paused_at.is_some() {
            self.paused_at = Some(wall);
        }
    }
}
