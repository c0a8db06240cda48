use stockroom_db::{ProductFixtures, SeedResult, SqlProductRepository, VerificationResult};

use crate::commands::{migrated_pool, prepare, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let repository = SqlProductRepository::new(pool.clone());

        let seeded = ProductFixtures::load(&repository)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = ProductFixtures::verify(&repository)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;
        check_verification(&verification)?;
        Ok::<SeedResult, StepFailure>(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", render_summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn check_verification(verification: &VerificationResult) -> Result<(), StepFailure> {
    if verification.all_present {
        return Ok(());
    }

    let failed_checks = verification.failed_checks();
    let message = if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for products: {}", failed_checks.join(", "))
    };
    Err(("seed_verification", message, 6u8))
}

fn render_summary(seeded: &SeedResult) -> String {
    let lines = ProductFixtures::products()
        .iter()
        .map(|seed| format!("  - {} ({})", seed.name, seed.price))
        .collect::<Vec<_>>();

    format!(
        "product fixtures ready (group `{}`, inserted {}, already present {}):\n{}",
        ProductFixtures::GROUP,
        seeded.inserted.len(),
        seeded.skipped.len(),
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use stockroom_db::{SeedResult, VerificationResult};

    use super::{check_verification, render_summary};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let verification = VerificationResult {
            all_present: false,
            checks: vec![
                ("First Product", true),
                ("Second Product", false),
                ("Third Product", false),
            ],
        };

        let (error_class, message, exit_code) =
            check_verification(&verification).expect_err("verification should fail");

        assert_eq!(error_class, "seed_verification");
        assert_eq!(exit_code, 6);
        assert_eq!(message, "Seed verification failed for products: Second Product, Third Product");
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let verification = VerificationResult { all_present: false, checks: Vec::new() };

        let (_, message, _) = check_verification(&verification).expect_err("should fail");

        assert_eq!(message, "Some seed data failed to load");
    }

    #[test]
    fn summary_lists_every_fixture() {
        let summary =
            render_summary(&SeedResult { inserted: Vec::new(), skipped: vec!["First Product"] });

        assert!(summary.starts_with(
            "product fixtures ready (group `products`, inserted 0, already present 1)"
        ));
        assert!(summary.contains("  - First Product (1)"));
        assert!(summary.contains("  - Second Product (2.2)"));
        assert!(summary.contains("  - Third Product (3.33)"));
    }
}
