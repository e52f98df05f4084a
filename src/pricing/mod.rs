pub mod black_scholes;

pub use black_scholes::{greeks, norm_cdf, norm_pdf, price, Greeks};
