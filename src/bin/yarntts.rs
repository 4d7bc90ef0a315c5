//! yarntts — command-line front-end for the YarnGPT text-to-speech API.
//!
//! Usage:
//!   yarntts convert <text> [-o <file>] [-v <voice>] [-f <format>]
//!   yarntts batch <file> [--output-dir <dir>] [--prefix <name>] [--sequential]
//!   yarntts voices                             List available voices
//!   yarntts formats                            List supported audio formats

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use yarntts::{AudioFormat, BatchMode, Error, SpeechRequest, Voice, YarnTts};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let outcome = match args[1].as_str() {
        "convert" => cmd_convert(&args[2..]).await,
        "batch" => cmd_batch(&args[2..]).await,
        "voices" => {
            cmd_voices();
            Ok(ExitCode::SUCCESS)
        }
        "formats" => {
            cmd_formats();
            Ok(ExitCode::SUCCESS)
        }
        "version" | "--version" | "-V" => {
            println!("yarntts {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            if let Error::QuotaExceeded { .. } = err {
                eprintln!("Hint: free tier allows 80 TTS requests/day; see https://yarngpt.ai/account");
            }
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!(
        r#"yarntts — YarnGPT text-to-speech CLI

USAGE:
    yarntts <COMMAND> [OPTIONS]

COMMANDS:
    convert <text>     Convert text to speech and save to a file
        -o, --output <file>      Output path (default: output.<format>)
        -v, --voice <voice>      Voice name, e.g. idera, emma, jude
        -f, --format <format>    mp3, wav, opus or flac (default: mp3)
        -k, --api-key <key>      API key (or set YARNGPT_API_KEY)
    batch <file>       Convert each line of <file> to its own audio file
        --output-dir <dir>       Output directory (default: output)
        --prefix <name>          Filename prefix (default: audio)
        --sequential             Process items one at a time
        --concurrency <n>        Max concurrent requests (default: 8)
        -v, -f, -k               As for convert
    voices             List available voices
    formats            List supported audio formats
    version            Show version information
    help               Show this help message

ENVIRONMENT:
    YARNGPT_API_KEY    API key used when --api-key is not given"#
    );
}

struct CommonOpts {
    voice: Option<Voice>,
    format: Option<AudioFormat>,
    api_key: Option<String>,
}

fn build_client(api_key: Option<String>) -> Result<YarnTts, Error> {
    let mut builder = YarnTts::builder();
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    builder.build()
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, Error> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| Error::validation(format!("{} requires a value", flag)))
}

async fn cmd_convert(args: &[String]) -> Result<ExitCode, Error> {
    let mut text: Option<String> = None;
    let mut output: Option<PathBuf> = None;
    let mut opts = CommonOpts {
        voice: None,
        format: None,
        api_key: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => output = Some(PathBuf::from(take_value(args, &mut i, "--output")?)),
            "-v" | "--voice" => {
                opts.voice = Some(Voice::from_str(&take_value(args, &mut i, "--voice")?)?)
            }
            "-f" | "--format" => {
                opts.format = Some(AudioFormat::from_str(&take_value(args, &mut i, "--format")?)?)
            }
            "-k" | "--api-key" => opts.api_key = Some(take_value(args, &mut i, "--api-key")?),
            other if text.is_none() => text = Some(other.to_string()),
            other => return Err(Error::validation(format!("Unexpected argument: {}", other))),
        }
        i += 1;
    }

    let text = text.ok_or_else(|| Error::validation("convert requires a text argument"))?;
    let mut request = SpeechRequest::new(text);
    if let Some(voice) = opts.voice {
        request = request.voice(voice);
    }
    if let Some(format) = opts.format {
        request = request.format(format);
    }
    let output = output
        .unwrap_or_else(|| PathBuf::from(format!("output.{}", request.output_format().extension())));

    let client = build_client(opts.api_key)?;
    let path = client.synthesize_to_file(&request, &output).await?;
    client.close();

    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    println!("Saved {} ({} bytes)", path.display(), size);
    Ok(ExitCode::SUCCESS)
}

async fn cmd_batch(args: &[String]) -> Result<ExitCode, Error> {
    let mut input: Option<PathBuf> = None;
    let mut output_dir = PathBuf::from("output");
    let mut prefix = "audio".to_string();
    let mut sequential = false;
    let mut concurrency: Option<usize> = None;
    let mut opts = CommonOpts {
        voice: None,
        format: None,
        api_key: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--output-dir" => output_dir = PathBuf::from(take_value(args, &mut i, "--output-dir")?),
            "--prefix" => prefix = take_value(args, &mut i, "--prefix")?,
            "--sequential" => sequential = true,
            "--concurrency" => {
                let raw = take_value(args, &mut i, "--concurrency")?;
                concurrency = Some(raw.parse().map_err(|_| {
                    Error::validation(format!("Invalid concurrency value: {}", raw))
                })?);
            }
            "-v" | "--voice" => {
                opts.voice = Some(Voice::from_str(&take_value(args, &mut i, "--voice")?)?)
            }
            "-f" | "--format" => {
                opts.format = Some(AudioFormat::from_str(&take_value(args, &mut i, "--format")?)?)
            }
            "-k" | "--api-key" => opts.api_key = Some(take_value(args, &mut i, "--api-key")?),
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => return Err(Error::validation(format!("Unexpected argument: {}", other))),
        }
        i += 1;
    }

    let input = input.ok_or_else(|| Error::validation("batch requires an input file"))?;
    let contents = std::fs::read_to_string(&input)?;
    let requests: Vec<SpeechRequest> = contents
        .lines()
        .map(|line| {
            let mut request = SpeechRequest::new(line.trim());
            if let Some(voice) = opts.voice {
                request = request.voice(voice);
            }
            if let Some(format) = opts.format {
                request = request.format(format);
            }
            request
        })
        .collect();

    if requests.is_empty() {
        return Err(Error::validation("Input file contains no lines"));
    }

    let mode = if sequential {
        BatchMode::Sequential
    } else {
        match concurrency {
            Some(n) => BatchMode::Concurrent { max_concurrency: n },
            None => BatchMode::concurrent(),
        }
    };

    let client = build_client(opts.api_key)?;
    let result = client
        .synthesize_batch_to_files(&requests, &output_dir, &prefix, mode)
        .await?;
    client.close();

    println!(
        "{}/{} items succeeded (output in {})",
        result.success_count(),
        result.len(),
        output_dir.display()
    );
    let mut code = ExitCode::SUCCESS;
    for item in result.iter() {
        if let Err(err) = &item.outcome {
            eprintln!("  item {}: {}", item.index, err);
            code = ExitCode::FAILURE;
        }
    }
    Ok(code)
}

fn cmd_voices() {
    println!("Available voices:");
    for voice in Voice::ALL {
        println!("  {:<10} {}", voice.as_str(), voice.description());
    }
}

fn cmd_formats() {
    println!("Supported audio formats:");
    for format in AudioFormat::ALL {
        println!("  {:<6} {}", format.as_str(), format.mime_type());
    }
}
