use lungscope_client::InferenceConfig;

use crate::print_warn;

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<unset>")
}

pub fn handle_command(config: &InferenceConfig) -> anyhow::Result<()> {
    println!("transport       {}", config.transport);
    println!("api base        {}", or_unset(&config.api_base));
    println!("space url       {}", or_unset(&config.space_url));
    println!("space id        {}", or_unset(&config.space_id));
    println!("fn index        {}", config.fn_index);
    println!("api name        {}", config.api_name);
    println!("api param       {}", config.api_param);
    match config.stream_timeout {
        Some(timeout) => println!("stream timeout  {}s", timeout.as_secs()),
        None => println!("stream timeout  none"),
    }

    if let Err(e) = config.validate() {
        print_warn!("{e}");
    }
    Ok(())
}
