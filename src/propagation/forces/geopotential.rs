//! Spherical-harmonics gravity field
//!
//! Fully normalized coefficients C̄nm, S̄nm and fully normalized associated
//! Legendre functions without the Condon-Shortley phase. Only the
//! non-central part (n ≥ 2) is evaluated here; the central term belongs to
//! [`GravitationalAcceleration`](super::GravitationalAcceleration).
//!
//! Earth's full field comes from satkit's JGM3 tables; other bodies carry
//! their own coefficient sets.

use crate::error::{Error, Result};
use nalgebra::Vector3;

/// JGM3 reference GM (km³/s²)
pub const JGM3_MU: f64 = 398_600.441_5;

/// Highest degree of satkit's JGM3 tables
pub const JGM3_MAX_DEGREE: usize = 70;

/// EGM2008 reference GM (km³/s²)
pub const EGM2008_MU: f64 = 398_600.441_5;

/// EGM2008 reference radius (km)
pub const EGM2008_RADIUS: f64 = 6378.1363;

/// EGM2008 tide-free coefficients to degree and order 4
const EGM2008_LOW_DEGREE: &str = "
 2 0 -0.484165143790815D-03  0.000000000000000D+00
 2 1 -0.206615509074176D-09  0.138441389137979D-08
 2 2  0.243938357328313D-05 -0.140027370385934D-05
 3 0  0.957161207093473D-06  0.000000000000000D+00
 3 1  0.203046201047864D-05  0.248200415856872D-06
 3 2  0.904787894809528D-06 -0.619005475177618D-06
 3 3  0.721321757121568D-06  0.141434926192941D-05
 4 0  0.539965866638991D-06  0.000000000000000D+00
 4 1 -0.536157389388867D-06 -0.473567346518086D-06
 4 2  0.350501623962649D-06  0.662480026275829D-06
 4 3  0.990856766672321D-06 -0.200956723567452D-06
 4 4 -0.188519633023033D-06  0.308803882149194D-06
";

/// Triangular index of (n, m)
fn index(n: usize, m: usize) -> usize {
    n * (n + 1) / 2 + m
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeopotentialModel {
    /// Reference GM of the coefficients (km³/s²)
    pub mu: f64,
    /// Reference radius of the coefficients (km)
    pub radius: f64,
    max_degree: usize,
    c: Vec<f64>,
    s: Vec<f64>,
}

impl GeopotentialModel {
    /// All-zero field up to `max_degree`
    pub fn new(max_degree: usize, mu: f64, radius: f64) -> Result<Self> {
        if max_degree < 2 {
            return Err(Error::invalid("geopotential degree must be at least 2"));
        }
        if !(mu > 0.0 && radius > 0.0) {
            return Err(Error::invalid("geopotential GM and radius must be positive"));
        }
        let len = index(max_degree, max_degree) + 1;
        Ok(Self {
            mu,
            radius,
            max_degree,
            c: vec![0.0; len],
            s: vec![0.0; len],
        })
    }

    /// Embedded low-degree Earth field
    pub fn earth() -> Result<Self> {
        Self::parse(EGM2008_LOW_DEGREE, 4, EGM2008_MU, EGM2008_RADIUS)
    }

    /// Field with only the J2 zonal term
    pub fn j2(j2: f64, mu: f64, radius: f64) -> Result<Self> {
        let mut model = Self::new(2, mu, radius)?;
        model.set(2, 0, -j2 / 5.0_f64.sqrt(), 0.0)?;
        Ok(model)
    }

    /// Read `n m C S` rows, keeping terms up to `max_degree`
    ///
    /// Extra columns (formal errors) are ignored, Fortran `D` exponents are
    /// accepted, blank lines and `#` comments are skipped.
    pub fn parse(text: &str, max_degree: usize, mu: f64, radius: f64) -> Result<Self> {
        let mut model = Self::new(max_degree, mu, radius)?;
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(Error::Settings {
                    message: format!("geopotential line {}: expected `n m C S`", line_no + 1),
                });
            }
            let n = parse_field::<usize>(fields[0], line_no)?;
            let m = parse_field::<usize>(fields[1], line_no)?;
            if n > max_degree {
                continue;
            }
            let c = parse_coefficient(fields[2], line_no)?;
            let s = parse_coefficient(fields[3], line_no)?;
            model.set(n, m, c, s)?;
        }
        Ok(model)
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn set(&mut self, n: usize, m: usize, c: f64, s: f64) -> Result<()> {
        if m > n || n > self.max_degree {
            return Err(Error::out_of_range(format!(
                "coefficient ({n}, {m}) outside a degree {} field",
                self.max_degree
            )));
        }
        self.c[index(n, m)] = c;
        self.s[index(n, m)] = s;
        Ok(())
    }

    /// (C̄nm, S̄nm), zero outside the field
    pub fn coefficients(&self, n: usize, m: usize) -> (f64, f64) {
        if m > n || n > self.max_degree {
            return (0.0, 0.0);
        }
        (self.c[index(n, m)], self.s[index(n, m)])
    }

    /// Unnormalized zonal coefficient Jn = -C̄n0 √(2n+1)
    pub fn zonal(&self, n: usize) -> f64 {
        -self.coefficients(n, 0).0 * ((2 * n + 1) as f64).sqrt()
    }

    /// Non-central acceleration at a body-fixed position (km/s²)
    ///
    /// Sums degrees 2..=`degree` and orders up to `order`. Asking for more
    /// than the field holds is an error.
    pub fn acceleration(&self, position: &Vector3<f64>, degree: usize, order: usize) -> Result<Vector3<f64>> {
        check_truncation(degree, order, self.max_degree)?;
        if degree < 2 {
            return Ok(Vector3::zeros());
        }

        let (x, y, z) = (position.x, position.y, position.z);
        let r2 = x * x + y * y + z * z;
        let r = r2.sqrt();
        if r <= 0.0 {
            return Ok(Vector3::zeros());
        }
        // The longitude term is singular on the polar axis; step just off it
        let rho2 = (x * x + y * y).max(r2 * 1e-24);
        let rho = rho2.sqrt();

        let sin_phi = z / r;
        let cos_phi = rho / r;
        let tan_phi = sin_phi / cos_phi;
        let lambda = y.atan2(x);

        let p = legendre(degree, order + 1, sin_phi, cos_phi);
        let (mut du_dr, mut du_dphi, mut du_dlambda) = (0.0, 0.0, 0.0);

        let ratio = self.radius / r;
        let mut ratio_n = ratio;
        for n in 2..=degree {
            ratio_n *= ratio;
            let (mut sum_r, mut sum_phi, mut sum_lambda) = (0.0, 0.0, 0.0);
            for m in 0..=order.min(n) {
                let (c, s) = self.coefficients(n, m);
                let (sin_ml, cos_ml) = (m as f64 * lambda).sin_cos();
                let trig = c * cos_ml + s * sin_ml;
                let p_nm = p[index(n, m)];
                let p_next = if m < n { p[index(n, m + 1)] } else { 0.0 };
                let k = if m == 0 { 0.5 } else { 1.0 };
                let dp = (k * ((n - m) * (n + m + 1)) as f64).sqrt() * p_next - m as f64 * tan_phi * p_nm;

                sum_r += p_nm * trig;
                sum_phi += dp * trig;
                sum_lambda += m as f64 * p_nm * (s * cos_ml - c * sin_ml);
            }
            du_dr += (n + 1) as f64 * ratio_n * sum_r;
            du_dphi += ratio_n * sum_phi;
            du_dlambda += ratio_n * sum_lambda;
        }
        du_dr *= -self.mu / r2;
        du_dphi *= self.mu / r;
        du_dlambda *= self.mu / r;

        let radial = du_dr / r - z / (r2 * rho) * du_dphi;
        Ok(Vector3::new(
            radial * x - du_dlambda / rho2 * y,
            radial * y + du_dlambda / rho2 * x,
            du_dr / r * z + rho / r2 * du_dphi,
        ))
    }
}

/// Gravity field attached to a body
#[derive(Debug, Clone, PartialEq)]
pub enum GravityField {
    /// Coefficients supplied with the body
    Coefficients(GeopotentialModel),
    /// satkit's JGM3 Earth field
    Jgm3,
}

impl GravityField {
    pub fn max_degree(&self) -> usize {
        match self {
            Self::Coefficients(model) => model.max_degree(),
            Self::Jgm3 => JGM3_MAX_DEGREE,
        }
    }

    /// Non-central acceleration at a body-fixed position (km/s²)
    pub fn acceleration(&self, position: &Vector3<f64>, degree: usize, order: usize) -> Result<Vector3<f64>> {
        match self {
            Self::Coefficients(model) => model.acceleration(position, degree, order),
            Self::Jgm3 => {
                check_truncation(degree, order, JGM3_MAX_DEGREE)?;
                if order != degree {
                    return Err(Error::Unsupported {
                        message: format!("JGM3 field truncated at degree {degree} but order {order}"),
                    });
                }
                let r = position.norm();
                if degree < 2 || r <= 0.0 {
                    return Ok(Vector3::zeros());
                }
                let full = satkit::earthgravity::accel(
                    &(position * 1000.0),
                    degree,
                    satkit::earthgravity::GravityModel::JGM3,
                );
                let full = Vector3::new(full[0], full[1], full[2]) / 1000.0;
                Ok(full + position * (JGM3_MU / (r * r * r)))
            }
        }
    }
}

impl From<GeopotentialModel> for GravityField {
    fn from(model: GeopotentialModel) -> Self {
        Self::Coefficients(model)
    }
}

fn check_truncation(degree: usize, order: usize, max_degree: usize) -> Result<()> {
    if degree > max_degree {
        return Err(Error::out_of_range(format!(
            "degree {degree} requested from a degree {max_degree} field"
        )));
    }
    if order > degree {
        return Err(Error::out_of_range(format!("order {order} exceeds degree {degree}")));
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(field: &str, line_no: usize) -> Result<T> {
    field.parse().map_err(|_| Error::Settings {
        message: format!("geopotential line {}: bad index `{field}`", line_no + 1),
    })
}

fn parse_coefficient(field: &str, line_no: usize) -> Result<f64> {
    field.replace(['D', 'd'], "E").parse().map_err(|_| Error::Settings {
        message: format!("geopotential line {}: bad coefficient `{field}`", line_no + 1),
    })
}

/// Fully normalized P̄nm(sin φ) for n ≤ `degree`, m ≤ min(n, `order`)
fn legendre(degree: usize, order: usize, sin_phi: f64, cos_phi: f64) -> Vec<f64> {
    let mut p = vec![0.0; index(degree, degree) + 1];
    p[0] = 1.0;
    if degree == 0 {
        return p;
    }
    p[index(1, 1)] = 3.0_f64.sqrt() * cos_phi;

    // Sectorials
    for m in 2..=order.min(degree) {
        let f = ((2 * m + 1) as f64 / (2 * m) as f64).sqrt();
        p[index(m, m)] = f * cos_phi * p[index(m - 1, m - 1)];
    }

    for m in 0..=order.min(degree) {
        if m + 1 <= degree {
            p[index(m + 1, m)] = ((2 * m + 3) as f64).sqrt() * sin_phi * p[index(m, m)];
        }
        for n in (m + 2)..=degree {
            let nf = n as f64;
            let mf = m as f64;
            let a = ((2.0 * nf - 1.0) * (2.0 * nf + 1.0) / ((nf - mf) * (nf + mf))).sqrt();
            let b = ((2.0 * nf + 1.0) * (nf + mf - 1.0) * (nf - mf - 1.0)
                / ((nf - mf) * (nf + mf) * (2.0 * nf - 3.0)))
                .sqrt();
            p[index(n, m)] = a * sin_phi * p[index(n - 1, m)] - b * p[index(n - 2, m)];
        }
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const J2: f64 = 1.082_626_68e-3;

    fn j2_closed_form(r: &Vector3<f64>, mu: f64, radius: f64) -> Vector3<f64> {
        let rn = r.norm();
        let factor = 1.5 * J2 * mu * radius * radius / rn.powi(5);
        let z2_r2 = r.z * r.z / (rn * rn);
        Vector3::new(
            factor * r.x * (5.0 * z2_r2 - 1.0),
            factor * r.y * (5.0 * z2_r2 - 1.0),
            factor * r.z * (5.0 * z2_r2 - 3.0),
        )
    }

    #[test]
    fn test_legendre_low_degree() {
        let (s, c) = 0.4_f64.sin_cos();
        let p = legendre(3, 3, s, c);
        assert_relative_eq!(p[index(1, 0)], 3.0_f64.sqrt() * s, epsilon = 1e-14);
        assert_relative_eq!(p[index(2, 0)], 5.0_f64.sqrt() * (3.0 * s * s - 1.0) / 2.0, epsilon = 1e-14);
        assert_relative_eq!(p[index(2, 1)], 15.0_f64.sqrt() * s * c, epsilon = 1e-14);
        assert_relative_eq!(p[index(2, 2)], (15.0_f64 / 4.0).sqrt() * c * c, epsilon = 1e-14);
        assert_relative_eq!(
            p[index(3, 0)],
            7.0_f64.sqrt() * (5.0 * s * s * s - 3.0 * s) / 2.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_j2_matches_closed_form() {
        let model = GeopotentialModel::j2(J2, EGM2008_MU, EGM2008_RADIUS).unwrap();
        for r in [
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(4000.0, 3000.0, 5000.0),
            Vector3::new(-2000.0, 6500.0, -3000.0),
        ] {
            let a = model.acceleration(&r, 2, 0).unwrap();
            let expected = j2_closed_form(&r, EGM2008_MU, EGM2008_RADIUS);
            assert_relative_eq!(a, expected, epsilon = 1e-15, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_near_pole_is_finite() {
        let model = GeopotentialModel::earth().unwrap();
        let a = model.acceleration(&Vector3::new(0.0, 0.0, 7000.0), 4, 4).unwrap();
        assert!(a.iter().all(|v| v.is_finite()));
        let expected = j2_closed_form(&Vector3::new(0.0, 0.0, 7000.0), EGM2008_MU, EGM2008_RADIUS);
        assert!((a.z - expected.z).abs() < 0.01 * expected.z.abs());
    }

    #[test]
    fn test_embedded_earth_field() {
        let model = GeopotentialModel::earth().unwrap();
        assert_eq!(model.max_degree(), 4);
        assert_relative_eq!(model.zonal(2), 1.0826e-3, max_relative = 1e-4);
        let (c22, s22) = model.coefficients(2, 2);
        assert!(c22 > 0.0 && s22 < 0.0);
        assert_eq!(model.coefficients(5, 0), (0.0, 0.0));

        // Higher terms are a small correction on top of J2 in LEO
        let r = Vector3::new(4000.0, 3000.0, 5000.0);
        let full = model.acceleration(&r, 4, 4).unwrap();
        let j2_only = model.acceleration(&r, 2, 0).unwrap();
        let diff = (full - j2_only).norm();
        assert!(diff > 0.0 && diff < 0.01 * j2_only.norm());
    }

    #[test]
    fn test_parse_errors_and_truncation() {
        assert!(GeopotentialModel::parse("2 0 abc 0.0", 4, 1.0, 1.0).is_err());
        assert!(GeopotentialModel::parse("2 0", 4, 1.0, 1.0).is_err());
        assert!(GeopotentialModel::parse("2 3 1.0 0.0", 4, 1.0, 1.0).is_err());

        let text = "# n m C S sigmaC sigmaS\n 2 0 -1.0d-3 0.0 1e-12 1e-12\n 9 9 1.0 1.0\n";
        let model = GeopotentialModel::parse(text, 4, 1.0, 1.0).unwrap();
        assert_relative_eq!(model.coefficients(2, 0).0, -1.0e-3);
        assert!(GeopotentialModel::new(1, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_rejects_truncation_beyond_field() {
        let model = GeopotentialModel::earth().unwrap();
        let r = Vector3::new(4000.0, 3000.0, 5000.0);
        assert!(matches!(model.acceleration(&r, 8, 8), Err(Error::OutOfRange { .. })));
        assert!(model.acceleration(&r, 3, 4).is_err());

        let field = GravityField::from(model);
        assert_eq!(field.max_degree(), 4);
        assert!(field.acceleration(&r, 8, 8).is_err());
        assert!(GravityField::Jgm3.acceleration(&r, 80, 80).is_err());
        assert!(GravityField::Jgm3.acceleration(&r, 8, 4).is_err());
    }

    #[test]
    fn test_jgm3_agrees_with_embedded_low_degree() {
        let embedded = GeopotentialModel::earth().unwrap();
        for r in [Vector3::new(4000.0, 3000.0, 5000.0), Vector3::new(-6800.0, 1200.0, -900.0)] {
            let ours = embedded.acceleration(&r, 4, 4).unwrap();
            let jgm3 = GravityField::Jgm3.acceleration(&r, 4, 4).unwrap();
            assert_relative_eq!(jgm3, ours, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_jgm3_resolves_higher_degrees() {
        let r = Vector3::new(4000.0, 3000.0, 5000.0);
        let low = GravityField::Jgm3.acceleration(&r, 4, 4).unwrap();
        let high = GravityField::Jgm3.acceleration(&r, 20, 20).unwrap();
        let diff = (high - low).norm();
        // Degrees 5..20 in LEO sit a few orders below J2
        assert!(diff > 1e-4 * low.norm(), "diff {diff}");
        assert!(diff < 1e-2 * low.norm(), "diff {diff}");
    }
}
