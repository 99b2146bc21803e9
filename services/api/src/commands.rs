use crate::cli::{AddSchemeArgs, FindArgs, ProfileSetArgs};
use crate::infra::open_service;
use govschemes::config::AppConfig;
use govschemes::error::AppError;
use govschemes::telemetry;
use govschemes::workflows::schemes::{
    Profile, ProfileUpdate, Query, SchemeDraft, SchemeRecord, StateName,
    UserId,
};

/// Loads configuration and installs the log subscriber for one-shot commands.
pub(crate) fn prepare() -> Result<AppConfig, AppError> {
    install_telemetry(AppConfig::load()?)
}

fn install_telemetry(config: AppConfig) -> Result<AppConfig, AppError> {
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) fn find_schemes(config: &AppConfig, args: FindArgs) -> Result<(), AppError> {
    let service = open_service(config)?;
    let FindArgs {
        user,
        gender,
        age,
        state,
        income,
        student,
        married,
        explain,
    } = args;

    let query = Query {
        gender,
        age,
        state: StateName::new(&state),
        income,
        student,
        married,
    };
    let identity = user.map(UserId::new).filter(|identity| !identity.is_blank());
    let (outcome, explanations) = if explain {
        let explained = service.find_explained(identity.as_ref(), &query)?;
        (explained.outcome, Some(explained.explanations))
    } else {
        (service.find(identity.as_ref(), &query)?, None)
    };

    match &identity {
        Some(identity) => println!("Scheme search for {identity}"),
        None => println!("Scheme search"),
    }
    let resolved = &outcome.resolved;
    println!(
        "- effective query: gender={} age={} state={} income={} student={} married={}",
        resolved.gender,
        resolved.age,
        display_state(&resolved.state),
        resolved.income,
        resolved.student,
        resolved.married
    );
    if outcome.rejected_rows > 0 {
        println!(
            "- {} catalog row(s) skipped as malformed",
            outcome.rejected_rows
        );
    }

    if outcome.matches.is_empty() {
        println!("No eligible schemes found.");
    } else {
        println!("Eligible schemes:");
        for record in &outcome.matches {
            println!("  - {} ({})", record.name, record.state);
        }
    }

    if let Some(explanations) = explanations {
        println!("\nCriterion breakdown");
        for explanation in &explanations {
            let name = &explanation.record.name;
            if explanation.eligible() {
                println!("  - {name}: eligible");
                continue;
            }
            println!("  - {name}: excluded");
            let failed = explanation.checks.iter().filter(|check| !check.passed);
            for check in failed {
                println!("      {} failed: {}", check.criterion.label(), check.notes);
            }
        }
    }

    Ok(())
}

pub(crate) fn list_schemes(config: &AppConfig) -> Result<(), AppError> {
    let service = open_service(config)?;
    let catalog = service.list_all()?;

    println!("Scheme catalog ({} schemes)", catalog.records.len());
    for record in &catalog.records {
        print_scheme(record);
    }
    for rejected in &catalog.rejected {
        println!("  ! {rejected}");
    }
    Ok(())
}

pub(crate) fn add_scheme(config: &AppConfig, args: AddSchemeArgs) -> Result<(), AppError> {
    let service = open_service(config)?;
    let draft = SchemeDraft {
        name: args.name,
        state: args.state,
        gender: args.gender,
        start_age: args.start_age,
        end_age: args.end_age,
        income: args.income,
        student: args.student,
        married: args.married,
    };

    let added = service.add_scheme(draft)?;
    println!("Scheme added");
    print_scheme(&added.record);
    println!("- {} profile(s) notified", added.notified);
    for failure in &added.failures {
        println!("  ! {failure}");
    }
    Ok(())
}

pub(crate) fn set_profile(config: &AppConfig, args: ProfileSetArgs) -> Result<(), AppError> {
    let service = open_service(config)?;
    let update = ProfileUpdate {
        email: args.email,
        gender: args.gender,
        state: args.state,
        student: args.student,
        married: args.married,
    };

    let profile = service.save_profile(UserId::new(args.identity), update)?;
    println!("Profile saved");
    print_profile(&profile);
    Ok(())
}

pub(crate) fn show_profile(config: &AppConfig, identity: &str) -> Result<(), AppError> {
    let service = open_service(config)?;
    let identity = UserId::new(identity);
    match service.profile(&identity)? {
        Some(profile) => print_profile(&profile),
        None => println!("No profile stored for {identity}"),
    }
    Ok(())
}

pub(crate) fn list_profiles(config: &AppConfig) -> Result<(), AppError> {
    let service = open_service(config)?;
    let profiles = service.profiles()?;

    println!("Stored profiles ({})", profiles.len());
    for profile in &profiles {
        print_profile(profile);
    }
    Ok(())
}

fn print_scheme(record: &SchemeRecord) {
    let income = if record.income.is_unbounded() {
        "no ceiling".to_string()
    } else {
        format!("up to {}", record.income)
    };
    println!(
        "  - {} | state {} | gender {} | ages {}-{} | income {} | student {} | married {}",
        record.name,
        record.state,
        record.gender,
        record.start_age,
        record.end_age,
        income,
        record.student,
        record.married
    );
}

fn print_profile(profile: &Profile) {
    let email = if profile.email.is_empty() {
        "-"
    } else {
        profile.email.as_str()
    };
    let state = profile
        .state
        .as_ref()
        .map_or("any".to_string(), ToString::to_string);
    println!(
        "  - {} <{}> | gender {} | state {} | student {} | married {}",
        profile.identity, email, profile.gender, state, profile.student, profile.married
    );
}

fn display_state(state: &StateName) -> &str {
    if state.is_empty() {
        "unspecified"
    } else {
        state.as_str()
    }
}
