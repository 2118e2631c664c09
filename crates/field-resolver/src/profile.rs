//! Vertical thermodynamic profiles (soundings) at a single grid column.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wrf_common::{Celsius, GridPoint, Hectopascals, Kelvin, WrfError, WrfResult};

use crate::accessor::GridAccessor;
use crate::config::{ResolverConfig, DEFAULT_KAPPA};

/// Ratio of the gas constants of dry air and water vapour.
pub const EPSILON: f64 = 0.622;

/// Magnus coefficients (Bolton 1980).
const MAGNUS_E0_HPA: f64 = 6.112;
const MAGNUS_A: f64 = 17.67;
const MAGNUS_B_C: f64 = 243.5;

/// Gas constant for dry air (J/(kg·K)).
pub const R_DRY: f64 = 287.04;

/// Specific heat of dry air at constant pressure (J/(kg·K)).
pub const CP_DRY: f64 = 1005.7;

/// Latent heat of vaporization of water (J/kg).
pub const LATENT_HEAT_VAPORIZATION: f64 = 2.501e6;

/// Largest pressure step (hPa) when integrating along a moist adiabat.
const MOIST_STEP_HPA: f64 = 5.0;

/// Temperature and dewpoint against pressure for one grid column, ordered
/// from the lowest model level upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundingProfile {
    pub grid_point: GridPoint,
    pub time_index: usize,
    pub pressure_hpa: Vec<f64>,
    pub temperature_c: Vec<f64>,
    pub dewpoint_c: Vec<f64>,
    #[serde(skip, default = "default_kappa")]
    kappa: f64,
}

fn default_kappa() -> f64 {
    DEFAULT_KAPPA
}

/// Lifting condensation level of a surface parcel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiftingCondensationLevel {
    pub pressure_hpa: f64,
    pub temperature_c: f64,
}

/// Convective available potential energy and convective inhibition of the
/// surface parcel, both in J/kg. CIN is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvectiveEnergy {
    pub cape_j_kg: f64,
    pub cin_j_kg: f64,
}

impl SoundingProfile {
    pub fn len(&self) -> usize {
        self.pressure_hpa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressure_hpa.is_empty()
    }

    /// Lifting condensation level of a parcel starting at the lowest level.
    ///
    /// Temperature from Bolton (1980) eq. 15, pressure from Poisson's
    /// equation along the dry adiabat.
    pub fn lcl(&self) -> Option<LiftingCondensationLevel> {
        let p0 = *self.pressure_hpa.first()?;
        let t = Celsius(*self.temperature_c.first()?).to_kelvin().0;
        let td = Celsius(*self.dewpoint_c.first()?).to_kelvin().0;
        if td - 56.0 <= 0.0 || t <= 0.0 {
            return None;
        }

        let t_lcl = 1.0 / (1.0 / (td - 56.0) + (t / td).ln() / 800.0) + 56.0;
        let p_lcl = p0 * (t_lcl / t).powf(1.0 / self.kappa);

        Some(LiftingCondensationLevel {
            pressure_hpa: p_lcl,
            temperature_c: Kelvin(t_lcl).to_celsius().0,
        })
    }

    /// Temperature (°C) of a parcel lifted from the lowest level, at every
    /// profile pressure: dry adiabat up to the LCL, saturated pseudo-adiabat
    /// above it.
    ///
    /// `None` when there is no LCL or pressure does not strictly decrease
    /// upward.
    pub fn parcel_profile(&self) -> Option<Vec<f64>> {
        if self.pressure_hpa.windows(2).any(|w| !(w[1] < w[0])) {
            return None;
        }
        let lcl = self.lcl()?;
        let p0 = self.pressure_hpa[0];
        let t0 = Celsius(self.temperature_c[0]).to_kelvin().0;

        let mut moist_p = lcl.pressure_hpa;
        let mut moist_t = Celsius(lcl.temperature_c).to_kelvin().0;
        let parcel = self
            .pressure_hpa
            .iter()
            .map(|&p| {
                let t = if p >= lcl.pressure_hpa {
                    t0 * (p / p0).powf(self.kappa)
                } else {
                    moist_t = moist_adiabat(moist_t, moist_p, p);
                    moist_p = p;
                    moist_t
                };
                Kelvin(t).to_celsius().0
            })
            .collect();
        Some(parcel)
    }

    /// CAPE and CIN of the surface parcel.
    ///
    /// Buoyancy (parcel minus environment temperature) is integrated over
    /// ln(p), splitting layers where it changes sign. CAPE sums every
    /// positive area; CIN is the negative area below the level of free
    /// convection. Without any positive area both are zero.
    pub fn cape_cin(&self) -> Option<ConvectiveEnergy> {
        let parcel = self.parcel_profile()?;
        let buoyancy: Vec<f64> = parcel
            .iter()
            .zip(&self.temperature_c)
            .map(|(tp, te)| tp - te)
            .collect();

        let mut cape = 0.0;
        let mut cin = 0.0;
        let mut free = false;
        for (i, w) in self.pressure_hpa.windows(2).enumerate() {
            let (b0, b1) = (buoyancy[i], buoyancy[i + 1]);
            let (positive, negative) = split_layer(b0, b1, (w[0] / w[1]).ln());
            if b0 > 0.0 {
                free = true;
            }
            if !free {
                cin += negative;
            }
            if positive > 0.0 {
                free = true;
                cape += positive;
            }
        }
        if cape == 0.0 {
            cin = 0.0;
        }

        Some(ConvectiveEnergy {
            cape_j_kg: R_DRY * cape,
            cin_j_kg: R_DRY * cin,
        })
    }
}

/// Positive and negative parts of the integral of `b` over a layer of
/// thickness `dlnp`, with `b` linear in ln(p). The part nearer the bottom
/// of the layer comes from `b0`.
fn split_layer(b0: f64, b1: f64, dlnp: f64) -> (f64, f64) {
    if b0 >= 0.0 && b1 >= 0.0 {
        return (0.5 * (b0 + b1) * dlnp, 0.0);
    }
    if b0 <= 0.0 && b1 <= 0.0 {
        return (0.0, 0.5 * (b0 + b1) * dlnp);
    }
    let crossing = b0 / (b0 - b1);
    let lower = 0.5 * b0 * crossing * dlnp;
    let upper = 0.5 * b1 * (1.0 - crossing) * dlnp;
    if b0 > 0.0 {
        (lower, upper)
    } else {
        (upper, lower)
    }
}

/// Carry a saturated parcel at `t_k` from `p_from` to `p_to` (hPa) with RK4
/// steps of at most `MOIST_STEP_HPA`.
fn moist_adiabat(t_k: f64, p_from: f64, p_to: f64) -> f64 {
    let steps = ((p_from - p_to).abs() / MOIST_STEP_HPA).ceil().max(1.0) as usize;
    let dp = (p_to - p_from) / steps as f64;
    let mut t = t_k;
    let mut p = p_from;
    for _ in 0..steps {
        let k1 = moist_lapse_rate(t, p);
        let k2 = moist_lapse_rate(t + 0.5 * dp * k1, p + 0.5 * dp);
        let k3 = moist_lapse_rate(t + 0.5 * dp * k2, p + 0.5 * dp);
        let k4 = moist_lapse_rate(t + dp * k3, p + dp);
        t += dp * (k1 + 2.0 * k2 + 2.0 * k3 + k4) / 6.0;
        p += dp;
    }
    t
}

/// dT/dp (K/hPa) along a saturated pseudo-adiabat.
fn moist_lapse_rate(t_k: f64, p_hpa: f64) -> f64 {
    let es = saturation_vapor_pressure(Kelvin(t_k).to_celsius());
    let rs = EPSILON * es / (p_hpa - es);
    let numerator = R_DRY * t_k + LATENT_HEAT_VAPORIZATION * rs;
    let denominator = CP_DRY
        + LATENT_HEAT_VAPORIZATION * LATENT_HEAT_VAPORIZATION * rs * EPSILON / (R_DRY * t_k * t_k);
    numerator / denominator / p_hpa
}

/// Saturation vapour pressure over water (hPa) at `temperature`.
pub fn saturation_vapor_pressure(temperature: Celsius) -> f64 {
    MAGNUS_E0_HPA * (MAGNUS_A * temperature.0 / (temperature.0 + MAGNUS_B_C)).exp()
}

/// Dewpoint for a vapour pressure in hPa (inverse Magnus).
pub fn dewpoint_from_vapor_pressure(vapor_pressure_hpa: f64) -> Celsius {
    let ln_ratio = (vapor_pressure_hpa / MAGNUS_E0_HPA).ln();
    Celsius(MAGNUS_B_C * ln_ratio / (MAGNUS_A - ln_ratio))
}

/// Dewpoint from specific humidity (kg/kg) at `pressure`.
///
/// Non-positive humidity has no dewpoint and yields a non-finite value.
pub fn dewpoint_from_specific_humidity(pressure: Hectopascals, specific_humidity: f64) -> Celsius {
    let q = specific_humidity;
    let mixing_ratio = q / (1.0 - q);
    let vapor_pressure = pressure.0 * mixing_ratio / (EPSILON + mixing_ratio);
    dewpoint_from_vapor_pressure(vapor_pressure)
}

/// Build the sounding at `point` for time step `time`.
///
/// Levels where pressure, temperature or dewpoint is not finite are dropped.
/// At least two usable levels must remain.
pub fn build_profile(
    accessor: &GridAccessor<'_>,
    config: &ResolverConfig,
    time: usize,
    point: GridPoint,
) -> WrfResult<SoundingProfile> {
    accessor.check_time(time)?;
    accessor.grid_shape()?.check_point(point)?;

    let pressure = accessor.pressure_hpa(time)?;
    let theta_perturbation = accessor.mass3d("T", time)?;
    let vapor = accessor.mass3d("QVAPOR", time)?;
    if pressure.dim() != theta_perturbation.dim() || pressure.dim() != vapor.dim() {
        return Err(WrfError::shape_mismatch(format!(
            "pressure {:?}, T {:?} and QVAPOR {:?} differ in shape",
            pressure.dim(),
            theta_perturbation.dim(),
            vapor.dim()
        )));
    }

    let nz = pressure.dim().0;

    let base_theta = config.base_theta().0;
    let mut profile = SoundingProfile {
        grid_point: point,
        time_index: time,
        pressure_hpa: Vec::with_capacity(nz),
        temperature_c: Vec::with_capacity(nz),
        dewpoint_c: Vec::with_capacity(nz),
        kappa: config.kappa,
    };

    for k in 0..nz {
        let p = Hectopascals(pressure[[k, point.row, point.col]] as f64);
        let theta = Kelvin(theta_perturbation[[k, point.row, point.col]] as f64 + base_theta);
        let q = vapor[[k, point.row, point.col]] as f64;

        let t = Kelvin::from_potential(theta, p, config.kappa).to_celsius();
        let td = dewpoint_from_specific_humidity(p, q);

        if !(p.0.is_finite() && p.0 > 0.0 && t.0.is_finite() && td.0.is_finite()) {
            continue;
        }
        profile.pressure_hpa.push(p.0);
        profile.temperature_c.push(t.0);
        profile.dewpoint_c.push(td.0);
    }

    debug!(
        point = %point,
        time = time,
        levels = profile.len(),
        dropped = nz - profile.len(),
        "Built sounding profile"
    );

    if profile.len() < 2 {
        return Err(WrfError::InsufficientProfileData {
            row: point.row,
            col: point.col,
            finite_levels: profile.len(),
        });
    }

    Ok(profile)
}
