use crate::commands::{controller, header, print_snapshot, source_notice};
use anyhow::Result;
use automation_assist::automation::{estimate_duration, now_secs, AutomationParams};
use automation_assist::types::{classify, parse_unsigned, validate_address};
use automation_assist::{Endpoints, Stage, StageStatus, WizardController};
use colored::Colorize;
use num_bigint::BigUint;
use std::io::{self, Write};

pub async fn run(endpoints: &Endpoints) -> Result<()> {
    println!("\n{}", "Supra Automation Assist".bold().cyan());
    println!("{}", "=".repeat(80).cyan());
    println!(
        "{}",
        format!("Network: {} | RPC: {}", endpoints.network, endpoints.rpc_url).bright_black()
    );
    println!(
        "{}",
        "Signing is not available from the terminal; the wizard ends with a Supra CLI command."
            .bright_black()
    );

    let mut session = controller(endpoints);

    loop {
        connect(&mut session)?;
        progress(&session);

        let modules = session.scan_modules().await?;
        header("Modules");
        source_notice(&modules);
        for (i, module) in modules.items.iter().enumerate() {
            println!("  {}. {}", i + 1, module.name);
        }
        let names: Vec<String> = modules.items.iter().map(|m| m.name.clone()).collect();
        let module = choose("Module", &names)?;

        let functions = session.select_module(&module).await?;
        progress(&session);
        header(&format!("Entry functions in {}", module));
        source_notice(&functions);
        if !functions.is_live() && confirm("No entry functions were found. Try another address?", true)? {
            continue;
        }
        for (i, function) in functions.items.iter().enumerate() {
            println!("  {}. {}", i + 1, function.signature());
        }
        let names: Vec<String> = functions.items.iter().map(|f| f.name.clone()).collect();
        let function = session.select_function(&choose("Function", &names)?)?;
        progress(&session);

        for i in 0..function.generic_parameter_count {
            let value = prompt_with_validation(
                &format!("Type argument T{}", i),
                None,
                |v| !v.is_empty(),
                "Type argument is required",
            )?;
            session.set_type_argument(i, &value)?;
        }

        for (i, tag) in function.parameter_type_tags.iter().enumerate() {
            let kind = classify(tag);
            println!("  {}", kind.hint.bright_black());
            loop {
                let raw = prompt(&format!("{} ({}) [{}]", i, tag, kind.placeholder), None)?;
                let check = session.set_parameter(i, &raw)?;
                if check.valid {
                    break;
                }
                println!("{}", check.error.unwrap_or_default().red());
            }
        }

        let params = configure(&session).await?;
        match session.generate_command(&params) {
            Ok(command) => {
                header("Registration command");
                println!("{}", command);
            }
            Err(e) => println!("{} {}", "✗".red(), e.to_string().red()),
        }

        if !confirm("Build another task?", false)? {
            break;
        }
    }

    println!("\n{}", "Done.".green().bold());
    Ok(())
}

fn connect(session: &mut WizardController) -> Result<()> {
    header("Connect");
    loop {
        let address = prompt_with_validation(
            "Account address",
            None,
            |v| validate_address(v).valid,
            "Address must be 0x followed by 64 hex digits",
        )?;
        match session.use_manual_address(&address) {
            Ok(()) => return Ok(()),
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

async fn configure(session: &WizardController) -> Result<AutomationParams> {
    header("Configure");
    let max_gas = prompt_number("Max gas amount", &BigUint::from(session.max_gas_amount()))?;
    let snapshot = session.network_snapshot(&max_gas).await;
    print_snapshot(&snapshot);

    let gas_price_cap = prompt_number("Gas price cap", &BigUint::from(session.gas_price_cap()))?;
    let fee_cap = prompt_number("Automation fee cap", snapshot.fee.amount())?;

    let expiry = if confirm("Set expiry as a number of days from now?", false)? {
        let days = prompt_number("Days", &BigUint::from(1u8))?;
        let days = u64::try_from(days).unwrap_or(u64::MAX);
        let estimate = estimate_duration(days, now_secs());
        println!(
            "  {} executions, about {} tokens",
            estimate.executions,
            estimate.cost_tokens.bold()
        );
        BigUint::from(estimate.expiry_time_secs)
    } else {
        prompt_number("Expiry (unix seconds)", &BigUint::from(snapshot.default_expiry()))?
    };

    Ok(AutomationParams::new(max_gas, gas_price_cap, fee_cap, expiry))
}

fn progress(session: &WizardController) {
    let line: Vec<String> = session
        .state()
        .statuses()
        .map(|(stage, status)| {
            let label = format!("{}. {}", stage.number(), stage.title());
            match status {
                StageStatus::Completed => format!("✓ {}", label).green().to_string(),
                StageStatus::Active => label.bold().to_string(),
                StageStatus::Error(_) => format!("✗ {}", label).red().to_string(),
                StageStatus::Pending => label.bright_black().to_string(),
            }
        })
        .collect();
    println!("\n{}", line.join("  "));
    if let StageStatus::Error(reason) = session.state().status(Stage::Connect) {
        println!("{}", reason.red());
    }
}

/// Accepts a 1-based index or the exact name.
fn choose(label: &str, options: &[String]) -> Result<String> {
    let picked = prompt_with_validation(
        label,
        options.first().cloned(),
        |v| pick(options, v).is_some(),
        "Enter a number from the list or a name",
    )?;
    Ok(pick(options, &picked).unwrap_or(picked))
}

fn pick(options: &[String], input: &str) -> Option<String> {
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i)).cloned();
    }
    options.iter().find(|o| o.as_str() == input).cloned()
}

fn prompt_number(label: &str, default: &BigUint) -> Result<BigUint> {
    let value = prompt_with_validation(
        label,
        Some(default.to_string()),
        |v| parse_unsigned(v).is_some(),
        "Must be a non-negative whole number",
    )?;
    Ok(parse_unsigned(&value).unwrap_or_else(|| default.clone()))
}

fn prompt(label: &str, default: Option<String>) -> Result<String> {
    print!(
        "{}{}: ",
        label.bold(),
        default
            .as_ref()
            .map(|d| format!(" [{}]", d))
            .unwrap_or_default()
    );
    io::stdout().flush().ok();
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        anyhow::bail!("Input closed");
    }
    let s = buf.trim().to_string();
    if s.is_empty() {
        Ok(default.unwrap_or_default())
    } else {
        Ok(s)
    }
}

fn prompt_with_validation<F>(
    label: &str,
    default: Option<String>,
    validate: F,
    error_msg: &str,
) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    loop {
        let value = prompt(label, default.clone())?;
        if validate(&value) {
            return Ok(value);
        }
        println!("{}", error_msg.red());
    }
}

fn confirm(label: &str, default_yes: bool) -> Result<bool> {
    let default = if default_yes { "Y" } else { "N" };
    let ans = prompt(label, Some(default.into()))?;
    let ans_l = ans.to_lowercase();
    Ok(matches!(ans_l.as_str(), "y" | "yes"))
}
