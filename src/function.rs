// The complex functions used to bend the plane
//
// A function always knows how to go forward. To pull pixels backwards it
// needs either a closed-form inverse or a derivative, in which case the
// inverse is found by newton raphson iteration started from w itself.

use json::JsonValue;
use num::complex::Complex;

use crate::error::WarpError;

pub type ComplexFn = Box<dyn Fn(Complex<f64>) -> Complex<f64>>;

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexPolynomial {
    // Lowest power first
    coefficients : Vec<f64>
}

impl ComplexPolynomial {
    // Coefficients are written highest power first, as people write them
    pub fn from_json(input : &JsonValue) -> Result<ComplexPolynomial, WarpError> {
        if !input.is_array() || input.is_empty() {
            return Err(WarpError::InvalidConfig("polynomial needs a coefficients array".to_string()));
        }
        let coefficients = input.members().map(
            |i| i.as_f64().ok_or_else(
                || WarpError::InvalidConfig(format!("bad polynomial coefficient {}", i))
            )
        ).rev().collect::<Result<Vec<f64>, WarpError>>()?;
        Ok(ComplexPolynomial { coefficients })
    }

    pub fn differentiate(&self) -> ComplexPolynomial {
        ComplexPolynomial {
            coefficients: self.coefficients.iter().enumerate().skip(1).map(
                |(i, v)| (i as f64) * v
            ).collect()
        }
    }

    pub fn evaluate(&self, z : Complex<f64>) -> Complex<f64> {
        let mut acc = Complex::new(0.0, 0.0);
        let mut curr_pow = Complex::new(1.0, 0.0);
        for coeff in self.coefficients.iter() {
            acc += coeff * curr_pow;
            curr_pow *= z;
        }
        acc
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonSolver {
    pub max_iterations : usize,
    pub derivative_floor : f64
}

impl Default for NewtonSolver {
    fn default() -> NewtonSolver {
        NewtonSolver { max_iterations : 20, derivative_floor : 1e-6 }
    }
}

impl NewtonSolver {
    pub fn from_json(input : &JsonValue) -> NewtonSolver {
        let defaults = NewtonSolver::default();
        NewtonSolver {
            max_iterations : input["max_iterations"].as_usize().unwrap_or(defaults.max_iterations),
            derivative_floor : input["derivative_floor"].as_f64().unwrap_or(defaults.derivative_floor)
        }
    }

    // Solve f(z) = w starting at z = w. There is no distance based stop,
    // a vanishing derivative just hands back the current iterate.
    pub fn solve(&self, f : &ComplexFn, df : &ComplexFn, w : Complex<f64>) -> Complex<f64> {
        let mut z = w;
        for _ in 0..self.max_iterations {
            let diff = df(z);
            if diff.norm() < self.derivative_floor {
                break;
            }
            z = z - (f(z) - w) / diff;
        }
        z
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InverseStrategy {
    // Closed form if there is one, newton otherwise
    Auto,
    ClosedForm,
    Newton
}

impl InverseStrategy {
    pub fn from_json(input : &JsonValue) -> Result<InverseStrategy, WarpError> {
        match input.as_str().unwrap_or("auto") {
            "auto" => Ok(InverseStrategy::Auto),
            "closed_form" => Ok(InverseStrategy::ClosedForm),
            "newton" => Ok(InverseStrategy::Newton),
            other => Err(WarpError::InvalidConfig(format!("unknown inverse strategy `{}`", other)))
        }
    }
}

pub enum Inverter<'a> {
    ClosedForm(&'a ComplexFn),
    Newton {
        forward : &'a ComplexFn,
        derivative : &'a ComplexFn,
        solver : NewtonSolver
    }
}

impl<'a> Inverter<'a> {
    pub fn invert(&self, w : Complex<f64>) -> Complex<f64> {
        match self {
            Inverter::ClosedForm(inverse) => inverse(w),
            Inverter::Newton { forward, derivative, solver } => solver.solve(forward, derivative, w)
        }
    }

    pub fn is_closed_form(&self) -> bool {
        matches!(self, Inverter::ClosedForm(_))
    }
}

pub struct ComplexFunction {
    name : String,
    forward : ComplexFn,
    derivative : Option<ComplexFn>,
    inverse : Option<ComplexFn>
}

impl std::fmt::Debug for ComplexFunction {
    fn fmt(&self, f : &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexFunction")
            .field("name", &self.name)
            .field("derivative", &self.derivative.is_some())
            .field("inverse", &self.inverse.is_some())
            .finish()
    }
}

impl ComplexFunction {
    pub fn new<F>(name : &str, forward : F) -> ComplexFunction
        where F : Fn(Complex<f64>) -> Complex<f64> + 'static
    {
        ComplexFunction {
            name : name.to_string(),
            forward : Box::new(forward),
            derivative : None,
            inverse : None
        }
    }

    pub fn with_derivative<F>(mut self, derivative : F) -> ComplexFunction
        where F : Fn(Complex<f64>) -> Complex<f64> + 'static
    {
        self.derivative = Some(Box::new(derivative));
        self
    }

    pub fn with_inverse<F>(mut self, inverse : F) -> ComplexFunction
        where F : Fn(Complex<f64>) -> Complex<f64> + 'static
    {
        self.inverse = Some(Box::new(inverse));
        self
    }

    pub fn identity() -> ComplexFunction {
        ComplexFunction::new("identity", |z| z)
            .with_derivative(|_| Complex::new(1.0, 0.0))
            .with_inverse(|w| w)
    }

    pub fn square() -> ComplexFunction {
        ComplexFunction::new("square", |z| z * z)
            .with_derivative(|z| 2.0 * z)
            .with_inverse(|w| w.sqrt())
    }

    pub fn cube() -> ComplexFunction {
        ComplexFunction::new("cube", |z| z * z * z)
            .with_derivative(|z| 3.0 * z * z)
    }

    pub fn exp() -> ComplexFunction {
        ComplexFunction::new("exp", |z| z.exp())
            .with_derivative(|z| z.exp())
            .with_inverse(|w| w.ln())
    }

    pub fn reciprocal() -> ComplexFunction {
        ComplexFunction::new("reciprocal", |z| z.inv())
            .with_derivative(|z| -(z * z).inv())
            .with_inverse(|w| w.inv())
    }

    pub fn sin() -> ComplexFunction {
        ComplexFunction::new("sin", |z| z.sin())
            .with_derivative(|z| z.cos())
    }

    pub fn polynomial(polynomial : ComplexPolynomial) -> ComplexFunction {
        let differential = polynomial.differentiate();
        ComplexFunction::new("polynomial", move |z| polynomial.evaluate(z))
            .with_derivative(move |z| differential.evaluate(z))
    }

    // Either a bare name or an object with a name and its parameters
    pub fn from_json(input : &JsonValue) -> Result<ComplexFunction, WarpError> {
        let name = if input.is_null() {
            "square"
        } else {
            input.as_str().or_else(|| input["name"].as_str()).ok_or_else(
                || WarpError::InvalidConfig(format!("function needs a name, got {}", input))
            )?
        };
        match name {
            "identity" => Ok(ComplexFunction::identity()),
            "square" => Ok(ComplexFunction::square()),
            "cube" => Ok(ComplexFunction::cube()),
            "exp" => Ok(ComplexFunction::exp()),
            "reciprocal" => Ok(ComplexFunction::reciprocal()),
            "sin" => Ok(ComplexFunction::sin()),
            "polynomial" => {
                let polynomial = ComplexPolynomial::from_json(&input["coefficients"])?;
                Ok(ComplexFunction::polynomial(polynomial))
            },
            other => Err(WarpError::UnknownFunction(other.to_string()))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn forward(&self, z : Complex<f64>) -> Complex<f64> {
        (self.forward)(z)
    }

    pub fn derivative(&self, z : Complex<f64>) -> Option<Complex<f64>> {
        self.derivative.as_ref().map(|df| df(z))
    }

    pub fn has_inverse(&self) -> bool {
        self.inverse.is_some()
    }

    // Pick how to go from w back to z, failing if this function can't
    pub fn inverter(
        &self,
        strategy : InverseStrategy,
        solver : NewtonSolver
    ) -> Result<Inverter<'_>, WarpError> {
        match strategy {
            InverseStrategy::Auto => self.closed_form()
                .or_else(|| self.newton(solver))
                .ok_or_else(|| WarpError::NotInvertible(self.name.clone())),
            InverseStrategy::ClosedForm => self.closed_form()
                .ok_or_else(|| WarpError::NoClosedForm(self.name.clone())),
            InverseStrategy::Newton => self.newton(solver)
                .ok_or_else(|| WarpError::NoDerivative(self.name.clone()))
        }
    }

    fn closed_form(&self) -> Option<Inverter<'_>> {
        self.inverse.as_ref().map(Inverter::ClosedForm)
    }

    fn newton(&self, solver : NewtonSolver) -> Option<Inverter<'_>> {
        self.derivative.as_ref().map(
            |derivative| Inverter::Newton { forward : &self.forward, derivative, solver }
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn assert_close(a : Complex<f64>, b : Complex<f64>) {
        assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-9);
        assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-9);
    }

    #[test]
    fn test_polynomial_from_json() {
        // z^2 - 1
        let input = json::parse("[1, 0, -1]").unwrap();
        let poly = ComplexPolynomial::from_json(&input).unwrap();
        assert_close(poly.evaluate(Complex::new(2.0, 0.0)), Complex::new(3.0, 0.0));
        assert_close(poly.evaluate(Complex::new(0.0, 1.0)), Complex::new(-2.0, 0.0));
        let diff = poly.differentiate();
        assert_close(diff.evaluate(Complex::new(1.5, -1.0)), Complex::new(3.0, -2.0));
    }

    #[test]
    fn test_polynomial_rejects_bad_coefficients() {
        assert!(ComplexPolynomial::from_json(&json::parse("[]").unwrap()).is_err());
        assert!(ComplexPolynomial::from_json(&json::parse(r#"[1, "a"]"#).unwrap()).is_err());
        assert!(ComplexPolynomial::from_json(&JsonValue::Null).is_err());
    }

    #[test]
    fn test_newton_finds_square_root() {
        let square = ComplexFunction::square();
        let inverter = square.inverter(InverseStrategy::Newton, NewtonSolver::default()).unwrap();
        assert!(!inverter.is_closed_form());
        assert_close(inverter.invert(Complex::new(4.0, 0.0)), Complex::new(2.0, 0.0));
        let w = Complex::new(1.0, 2.0);
        let z = inverter.invert(w);
        assert_close(square.forward(z), w);
    }

    #[test]
    fn test_newton_stops_on_flat_derivative() {
        // Starting at w = 0 the derivative of z^2 vanishes straight away
        let square = ComplexFunction::square();
        let inverter = square.inverter(InverseStrategy::Newton, NewtonSolver::default()).unwrap();
        assert_eq!(inverter.invert(Complex::new(0.0, 0.0)), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_newton_iteration_cap() {
        let solver = NewtonSolver { max_iterations : 0, derivative_floor : 1e-6 };
        let cube = ComplexFunction::cube();
        let inverter = cube.inverter(InverseStrategy::Auto, solver).unwrap();
        // No iterations means the starting point comes straight back
        assert_eq!(inverter.invert(Complex::new(8.0, 0.0)), Complex::new(8.0, 0.0));
        let inverter = cube.inverter(InverseStrategy::Auto, NewtonSolver::default()).unwrap();
        assert_close(inverter.invert(Complex::new(8.0, 0.0)), Complex::new(2.0, 0.0));
    }

    #[test]
    fn test_closed_form_is_principal() {
        let square = ComplexFunction::square();
        let inverter = square.inverter(InverseStrategy::Auto, NewtonSolver::default()).unwrap();
        assert!(inverter.is_closed_form());
        assert_close(inverter.invert(Complex::new(-4.0, 0.0)), Complex::new(0.0, 2.0));
        let exp = ComplexFunction::exp();
        let inverter = exp.inverter(InverseStrategy::ClosedForm, NewtonSolver::default()).unwrap();
        assert_close(inverter.invert(Complex::new(1.0, 0.0)), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_missing_capabilities() {
        let bare = ComplexFunction::new("bare", |z| z * z);
        assert!(matches!(
            bare.inverter(InverseStrategy::Auto, NewtonSolver::default()),
            Err(WarpError::NotInvertible(_))
        ));
        assert!(matches!(
            ComplexFunction::cube().inverter(InverseStrategy::ClosedForm, NewtonSolver::default()),
            Err(WarpError::NoClosedForm(_))
        ));
        let inverse_only = ComplexFunction::new("half", |z| z * 2.0).with_inverse(|w| w / 2.0);
        assert!(matches!(
            inverse_only.inverter(InverseStrategy::Newton, NewtonSolver::default()),
            Err(WarpError::NoDerivative(_))
        ));
        assert!(inverse_only.inverter(InverseStrategy::Auto, NewtonSolver::default()).is_ok());
    }

    #[test]
    fn test_from_json_catalogue() {
        let f = ComplexFunction::from_json(&json::parse(r#""cube""#).unwrap()).unwrap();
        assert_eq!(f.name(), "cube");
        assert!(!f.has_inverse());
        let f = ComplexFunction::from_json(
            &json::parse(r#"{ "name" : "polynomial", "coefficients" : [1, 0, 0, -8] }"#).unwrap()
        ).unwrap();
        assert_close(f.forward(Complex::new(2.0, 0.0)), Complex::new(0.0, 0.0));
        assert_close(f.derivative(Complex::new(1.0, 0.0)).unwrap(), Complex::new(3.0, 0.0));
        // Missing means the square map
        assert_eq!(ComplexFunction::from_json(&JsonValue::Null).unwrap().name(), "square");
        // A named function is only implied when nothing is given at all
        assert!(matches!(
            ComplexFunction::from_json(&json::parse(r#"{ "coefficients" : [1, 0, -1] }"#).unwrap()),
            Err(WarpError::InvalidConfig(_))
        ));
        assert!(matches!(
            ComplexFunction::from_json(&json::parse("3").unwrap()),
            Err(WarpError::InvalidConfig(_))
        ));
        assert!(matches!(
            ComplexFunction::from_json(&json::parse(r#""tan""#).unwrap()),
            Err(WarpError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_inverse_strategy_from_json() {
        assert_eq!(InverseStrategy::from_json(&JsonValue::Null).unwrap(), InverseStrategy::Auto);
        assert_eq!(
            InverseStrategy::from_json(&json::parse(r#""newton""#).unwrap()).unwrap(),
            InverseStrategy::Newton
        );
        assert!(InverseStrategy::from_json(&json::parse(r#""guess""#).unwrap()).is_err());
    }

    #[test]
    fn test_newton_solver_from_json() {
        let solver = NewtonSolver::from_json(&json::parse(r#"{ "max_iterations" : 5 }"#).unwrap());
        assert_eq!(solver, NewtonSolver { max_iterations : 5, derivative_floor : 1e-6 });
    }
}
