pub fn run() -> anyhow::Result<()> {
    println!("slotwatch {}", env!("CARGO_PKG_VERSION"));
    println!("Appointment slot watcher with durable exactly-once notifications");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        let result = run();
        assert!(result.is_ok());
    }
}
