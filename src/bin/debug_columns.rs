use census_parser::{
    AssemblerConfig, LineRoute, PageAssembler, PageSource, PdfPageSource, TextPageSource,
};
use std::env;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_columns <pdf_or_txt_path> [page | min-max]");
        std::process::exit(1);
    }

    let range = args.get(2).map(|s| s.as_str()).unwrap_or("20-20");
    let (min_page, max_page) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(20), b.parse().unwrap_or(20))
    } else {
        let page = range.parse().unwrap_or(20);
        (page, page)
    };

    let path = &args[1];
    let source: Box<dyn PageSource> = if path.ends_with(".txt") {
        Box::new(TextPageSource::from_path(path).expect("Failed to read text"))
    } else {
        Box::new(PdfPageSource::open(path).expect("Failed to extract"))
    };

    let config = AssemblerConfig {
        annotate_lines: true,
        ..AssemblerConfig::with_pages(min_page, max_page)
    };
    if let Err(e) = config.validate(source.page_count()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let mut assembler = PageAssembler::new(config.clone());
    for page in min_page..=max_page {
        let lines = match source.page_lines(page) {
            Ok(lines) => lines,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
        println!("=== PAGE {} ({} lines) ===", page, lines.len());
        for (line_no, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            match config.route_line(page, line_no, line) {
                LineRoute::PageMarker => println!("{:4} [page marker]", line_no),
                LineRoute::Title(text) => {
                    println!("{:4} len={:3} [title] {:?}", line_no, len, text)
                }
                LineRoute::Columns(columns) => {
                    let [a, b, c] = columns.columns();
                    println!("{:4} len={:3} {:?} | {:?} | {:?}", line_no, len, a, b, c);
                }
            }
        }
        println!();
        assembler.push_page(page, &lines);
    }

    println!("=== ANNOTATED STREAM ===");
    println!("{}", assembler.finish());
}
