//! Build a normal/gamma mixture, query it, condition it and sample
//! from the posterior.

use num_rational::Rational64;
use num_traits::ToPrimitive;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sumprod_core::{RealDist, RealLeaf, Spn, SpnError, SumSpn, Symbol, Transform};

fn main() -> Result<(), SpnError> {
    let x = Symbol::new("X");
    let normal = RealLeaf::new(x.clone(), RealDist::Normal { loc: 0.0, scale: 1.0 })?;
    let gamma = RealLeaf::new(x.clone(), RealDist::Gamma { a: 1.0, loc: 0.0, scale: 1.0 })?;
    let spn: Spn = SumSpn::new(
        vec![normal.into(), gamma.into()],
        vec![
            Rational64::new(2, 3).to_f64().unwrap_or(0.0).ln(),
            Rational64::new(1, 3).to_f64().unwrap_or(0.0).ln(),
        ],
    )?
    .into();

    let negative = Transform::id(x.clone()).lt(0.0);
    println!("P(X < 0)    = {:.6}", spn.logprob(&negative)?.exp());

    let band = Transform::id(x.clone()).pow(2).lt(4.0);
    println!("P(X^2 < 4)  = {:.6}", spn.logprob(&band)?.exp());

    let posterior = spn.condition(&negative)?;
    println!("posterior P(X < 0) = {:.6}", posterior.logprob(&negative)?.exp());

    let mut rng = StdRng::seed_from_u64(0);
    let draws = posterior.sample(5, &mut rng)?;
    for (i, draw) in draws.iter().enumerate() {
        println!("draw {i}: {:?}", draw.get(&x));
    }
    Ok(())
}
