//black-scholes pricing and greeks for european options
//inputs are validated up front so ln(s/k) and vol * sqrt(t) are always defined
//greeks are in raw units: vega per 1.00 of volatility, theta per year,
//rho per 1.00 of rate

use crate::error::EvalResult;
use crate::instrument::{OptionParameters, OptionType};
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

//option price sensitivities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

//standard normal cdf
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

//standard normal pdf
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

//d1 and d2 of validated parameters
fn d1_d2(p: &OptionParameters) -> (f64, f64) {
    let vol_sqrt_t = p.volatility * p.time_to_expiry.sqrt();
    let d1 = ((p.spot / p.strike).ln()
        + (p.risk_free_rate + 0.5 * p.volatility * p.volatility) * p.time_to_expiry)
        / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

//black-scholes price of a european option
pub fn price(params: &OptionParameters) -> EvalResult<f64> {
    params.validate()?;

    let (d1, d2) = d1_d2(params);
    let discounted_strike = params.strike * (-params.risk_free_rate * params.time_to_expiry).exp();

    Ok(match params.option_type {
        OptionType::Call => params.spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
        OptionType::Put => discounted_strike * norm_cdf(-d2) - params.spot * norm_cdf(-d1),
    })
}

//greeks of a european option
pub fn greeks(params: &OptionParameters) -> EvalResult<Greeks> {
    params.validate()?;

    let (d1, d2) = d1_d2(params);
    let sqrt_t = params.time_to_expiry.sqrt();
    let discount = (-params.risk_free_rate * params.time_to_expiry).exp();
    let pdf_d1 = norm_pdf(d1);

    let gamma = pdf_d1 / (params.spot * params.volatility * sqrt_t);
    let vega = params.spot * pdf_d1 * sqrt_t;
    let decay = -params.spot * pdf_d1 * params.volatility / (2.0 * sqrt_t);
    let carry = params.risk_free_rate * params.strike * discount;

    let greeks = match params.option_type {
        OptionType::Call => Greeks {
            delta: norm_cdf(d1),
            gamma,
            vega,
            theta: decay - carry * norm_cdf(d2),
            rho: params.strike * params.time_to_expiry * discount * norm_cdf(d2),
        },
        OptionType::Put => Greeks {
            delta: norm_cdf(d1) - 1.0,
            gamma,
            vega,
            theta: decay + carry * norm_cdf(-d2),
            rho: -params.strike * params.time_to_expiry * discount * norm_cdf(-d2),
        },
    };

    Ok(greeks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use approx::assert_relative_eq;

    fn atm(option_type: OptionType) -> OptionParameters {
        OptionParameters {
            spot: 100.0,
            strike: 100.0,
            time_to_expiry: 1.0,
            risk_free_rate: 0.05,
            volatility: 0.2,
            option_type,
        }
    }

    #[test]
    fn test_reference_call_price() {
        let call = price(&atm(OptionType::Call)).unwrap();
        assert_relative_eq!(call, 10.45, epsilon = 0.01);
    }

    #[test]
    fn test_reference_put_price() {
        let put = price(&atm(OptionType::Put)).unwrap();
        assert_relative_eq!(put, 5.57, epsilon = 0.01);
    }

    #[test]
    fn test_put_call_parity() {
        let cases = [
            (100.0, 100.0, 1.0, 0.05, 0.2),
            (80.0, 100.0, 0.25, 0.01, 0.45),
            (150.0, 120.0, 2.0, 0.08, 0.1),
            (42.0, 40.0, 0.05, 0.0, 0.9),
        ];

        for (spot, strike, time, rate, vol) in cases {
            let call_params =
                OptionParameters::new(spot, strike, time, rate, vol, OptionType::Call).unwrap();
            let call = price(&call_params).unwrap();
            let put = price(&call_params.with_type(OptionType::Put)).unwrap();

            let parity = spot - strike * (-rate * time).exp();
            assert_relative_eq!(call - put, parity, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_delta_difference_is_one() {
        for spot in [60.0, 95.0, 100.0, 130.0] {
            let mut params = atm(OptionType::Call);
            params.spot = spot;
            let call = greeks(&params).unwrap();
            let put = greeks(&params.with_type(OptionType::Put)).unwrap();
            assert_relative_eq!(call.delta - put.delta, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reference_greeks() {
        let call = greeks(&atm(OptionType::Call)).unwrap();
        assert_relative_eq!(call.delta, 0.6368, epsilon = 1e-4);
        assert_relative_eq!(call.gamma, 0.018762, epsilon = 1e-5);
        assert_relative_eq!(call.vega, 37.524, epsilon = 1e-2);
        assert_relative_eq!(call.theta, -6.414, epsilon = 1e-2);
        assert_relative_eq!(call.rho, 53.232, epsilon = 1e-2);

        let put = greeks(&atm(OptionType::Put)).unwrap();
        assert_relative_eq!(put.gamma, call.gamma, epsilon = 1e-12);
        assert_relative_eq!(put.vega, call.vega, epsilon = 1e-12);
        assert_relative_eq!(put.theta, -1.658, epsilon = 1e-2);
        assert_relative_eq!(put.rho, -41.890, epsilon = 1e-2);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let mut params = atm(OptionType::Call);
        params.volatility = 0.0;
        assert!(matches!(
            price(&params),
            Err(EvalError::InvalidParameter { name: "volatility", .. })
        ));

        let mut params = atm(OptionType::Put);
        params.time_to_expiry = -0.5;
        assert!(greeks(&params).is_err());

        let mut params = atm(OptionType::Call);
        params.strike = 0.0;
        assert!(price(&params).is_err());
    }

    #[test]
    fn test_norm_cdf_symmetry() {
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(1.96), 0.975, epsilon = 1e-3);
        assert_relative_eq!(norm_cdf(1.3) + norm_cdf(-1.3), 1.0, epsilon = 1e-12);
    }
}
