use crate::support::{existing_dir_or_exit, image_basenames_or_exit, print_json_or_exit};
use serde_json::json;
use tilecheck_kernel::{DatasetInventory, FileTable, StandardSelector, TokenError, tokenize};

fn tokenize_all(filenames: &[String], robo: i64) -> Result<FileTable, TokenError> {
    let standard = StandardSelector::from_code(robo)?.resolve(filenames)?;
    tokenize(filenames, standard)
}

pub fn run(input_dir: String, robo: i64, json_output: bool) {
    let input_dir = existing_dir_or_exit(&input_dir, "input");
    let filenames = image_basenames_or_exit(&input_dir);
    let table = tokenize_all(&filenames, robo).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let inventory = DatasetInventory::from_table(&table);

    if json_output {
        let payload = json!({
            "schema": 1,
            "standard": table.standard(),
            "inventory": inventory,
            "records": table.records(),
        });
        print_json_or_exit(&payload, "tokenize");
        return;
    }

    println!(
        "[tokenize] {} files, standard {}, experiment {}",
        table.len(),
        table.standard(),
        inventory.experiment
    );
    for record in table.iter() {
        println!(
            "  {:<6} T{:<3} {:>4}  {:<12} {}",
            record.well, record.timepoint, record.panel, record.channel, record.filename
        );
    }
}
