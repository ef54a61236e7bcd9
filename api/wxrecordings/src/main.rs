use std::env;

use wxrecordings::{
    default_selection, encode_permalink, resolve_permalink, RecordingsClient, Selection,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <command> [args...]", args[0]);
        eprintln!("Commands:");
        eprintln!("  list - Print every pass in the manifest with its enhancement tokens");
        eprintln!("  show [permalink] - Print the resolved selection as JSON");
        eprintln!("  url <permalink> - Print the image URL a permalink resolves to");
        eprintln!("  fetch <permalink> <file> - Download the image a permalink resolves to");
        eprintln!("");
        eprintln!("The backend base URL is taken from WXVIEWER_BASE_URL.");
        eprintln!("");
        eprintln!("Examples:");
        eprintln!("  {} list", args[0]);
        eprintln!("  {} show /20230101000000/20230101001500/noaa-19/msa?precip=true", args[0]);
        eprintln!("  {} fetch /20230101000000/20230101001500/noaa-19/mcir mcir.webp", args[0]);
        std::process::exit(1);
    }

    let base_url = match env::var("WXVIEWER_BASE_URL") {
        Ok(base_url) => base_url,
        Err(_) => {
            eprintln!("WXVIEWER_BASE_URL is not set");
            std::process::exit(1);
        }
    };

    let command = &args[1];
    let client = RecordingsClient::new(&base_url);

    match command.as_str() {
        "list" => {
            let passes = client.fetch_pass_list().await?;

            println!("Found {} passes:", passes.len());
            for pass in &passes {
                let tokens: Vec<String> =
                    pass.enhancements.iter().map(|e| e.token()).collect();
                println!("  {} {} [{}]", pass.start_label(), pass.satellite, tokens.join(" "));
            }
        }

        "show" => {
            let passes = client.fetch_pass_list().await?;

            let selection = match args.get(2) {
                Some(link) => resolve_permalink(&passes, link),
                None => default_selection(&passes),
            };

            match selection {
                Some(selection) => {
                    print_selection(&passes, selection)?;
                    println!("{}", encode_permalink(&passes, selection));
                }
                None => {
                    eprintln!("The manifest is empty");
                    std::process::exit(1);
                }
            }
        }

        "url" => {
            if args.len() < 3 {
                eprintln!("Not enough arguments for url command");
                std::process::exit(1);
            }

            let passes = client.fetch_pass_list().await?;
            match resolve_permalink(&passes, &args[2]) {
                Some(selection) => {
                    let pass = &passes[selection.pass];
                    let enhancement = &pass.enhancements[selection.enhancement];
                    println!("{}", client.image_url(pass, enhancement));
                }
                None => {
                    eprintln!("The manifest is empty");
                    std::process::exit(1);
                }
            }
        }

        "fetch" => {
            if args.len() < 4 {
                eprintln!("Not enough arguments for fetch command");
                std::process::exit(1);
            }

            let passes = client.fetch_pass_list().await?;
            match resolve_permalink(&passes, &args[2]) {
                Some(selection) => {
                    let pass = &passes[selection.pass];
                    let enhancement = &pass.enhancements[selection.enhancement];
                    let url = client.image_url(pass, enhancement);

                    println!("Fetching {} for {}", enhancement.label(), pass.title());
                    let bytes = client.fetch_image(&url).await?;

                    std::fs::write(&args[3], &bytes)?;
                    println!("Image saved to: {}", args[3]);
                }
                None => {
                    eprintln!("The manifest is empty");
                    std::process::exit(1);
                }
            }
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_selection(
    passes: &[wxrecordings::Pass],
    selection: Selection,
) -> Result<(), anyhow::Error> {
    let pass = &passes[selection.pass];
    let enhancement = &pass.enhancements[selection.enhancement];

    println!("{}", pass.title());
    println!("{}", serde_json::to_string_pretty(pass)?);
    println!("Selected enhancement: {}", serde_json::to_string(enhancement)?);

    Ok(())
}
