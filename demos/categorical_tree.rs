use std::fs::File;
use std::io::Write;

use linfa::prelude::*;
use linfa_cart::DecisionTreeParams;
use ndarray::{Array1, Array2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Synthetic loan records: income in thousands and the applicant's region as a category code.
/// Applicants from regions 1 and 4 with an income above 40 repay.
fn generate(n_samples: usize, rng: &mut SmallRng) -> DatasetBase<Array2<f64>, Array1<usize>> {
    let mut records = Array2::zeros((n_samples, 2));
    let mut targets = Array1::zeros(n_samples);

    for (mut row, target) in records.rows_mut().into_iter().zip(targets.iter_mut()) {
        let income = rng.gen_range(10.0..90.0);
        let region = rng.gen_range(0..6) as f64;
        // flip one label out of twenty
        let noise = rng.gen_bool(0.05);

        row[0] = income;
        row[1] = region;
        *target = ((income > 40.0 && (region == 1.0 || region == 4.0)) != noise) as usize;
    }

    DatasetBase::new(records, targets)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SmallRng::seed_from_u64(42);
    let train = generate(800, &mut rng);
    let test = generate(200, &mut rng);

    println!("Training model with unlimited depth...");
    let full_model = DecisionTreeParams::from_feature_tags(&["real", "categorical"])?.fit(&train)?;

    let cm = full_model.predict(&test).confusion_matrix(&test)?;
    println!("{:?}", cm);
    println!(
        "Test accuracy with unlimited depth: {:.2}%, {} leaves",
        100.0 * cm.accuracy(),
        full_model.num_leaves()
    );

    println!("Training model with max depth 3 and at least 10 samples per leaf...");
    let pruned_model = DecisionTreeParams::from_feature_tags(&["real", "categorical"])?
        .max_depth(Some(3))
        .min_samples_leaf(Some(10))
        .fit(&train)?;

    let cm = pruned_model.predict(&test).confusion_matrix(&test)?;
    println!("{:?}", cm);
    println!(
        "Test accuracy with max depth 3: {:.2}%, {} leaves",
        100.0 * cm.accuracy(),
        pruned_model.num_leaves()
    );

    let feats = pruned_model.features();
    println!("Features trained in this tree {:?}", feats);
    println!("Feature importance {:?}", pruned_model.feature_importance());

    let mut tikz = File::create("decision_tree_example.tex")?;
    tikz.write_all(
        pruned_model
            .export_to_tikz()
            .with_legend()
            .to_string()
            .as_bytes(),
    )?;
    println!(" => generate tree description with `latex decision_tree_example.tex`!");

    Ok(())
}
