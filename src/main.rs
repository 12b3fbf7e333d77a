use clap::{arg,crate_version,Arg,ArgAction,Command};
use retrobox::archive::{self,CompressAlg};
use retrobox::progress::ProgressCounter;

const RCH: &str = "unreachable was reached";

fn main() -> retrobox::STDRESULT
{
    env_logger::init();

    let long_help =
"Examples:
---------
Pack:    `retrobox pack --method lz77 --archive out.box a.txt b.txt`
Unpack:  `retrobox unpack --archive out.box --out-dir restored/`";

    let methods = ["static-huffman","adaptive-huffman","lz77","lz78"];

    let mut main_cmd = Command::new("retrobox")
        .about("Pack and unpack multi-file archives with retro compression algorithms")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("pack")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods).required(true))
        .arg(arg!(-a --archive <PATH> "archive output path").required(true))
        .arg(Arg::new("FILES").help("input files, in archive order").required(true).num_args(1..).action(ArgAction::Append))
        .about("pack files into an archive"));

    main_cmd = main_cmd.subcommand(Command::new("unpack")
        .arg(arg!(-a --archive <PATH> "archive input path").required(true))
        .arg(arg!(-o --"out-dir" <PATH> "directory to write unpacked files into").required(true))
        .arg(Arg::new("no-overwrite").long("no-overwrite").help("refuse to overwrite files already present in out-dir").action(ArgAction::SetTrue))
        .about("unpack an archive"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("pack") {
        let archive_path = cmd.get_one::<String>("archive").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let files: Vec<std::path::PathBuf> = cmd.get_many::<String>("FILES").expect(RCH)
            .map(std::path::PathBuf::from)
            .collect();
        let alg: CompressAlg = method.parse()?;
        let progress = ProgressCounter::new();
        archive::pack(&files,std::path::Path::new(archive_path),alg,&progress)?;
        log::info!("packed {} file(s) into {}",files.len(),archive_path);
    }

    if let Some(cmd) = matches.subcommand_matches("unpack") {
        let archive_path = cmd.get_one::<String>("archive").expect(RCH);
        let out_dir = cmd.get_one::<String>("out-dir").expect(RCH);
        let no_overwrite = cmd.get_flag("no-overwrite");
        let options = archive::Options { overwrite: !no_overwrite };
        let progress = ProgressCounter::new();
        archive::unpack_with_options(std::path::Path::new(archive_path),std::path::Path::new(out_dir),&progress,&options)?;
        log::info!("unpacked {} into {}",archive_path,out_dir);
    }

    Ok(())
}
