use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use axres::AxmlDocument;
use axres_manifest::Apk;
use bat::PrettyPrinter;

pub(crate) fn command_axml(path: &Path) -> Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();

    let xml = match Apk::new(path) {
        Ok(apk) => apk.get_xml_string().to_owned(),
        Err(_) => {
            // not inside an APK - maybe this is a bare AndroidManifest.xml?
            let file = std::fs::read(path)
                .with_context(|| format!("can't open and read file: {:?}", path))?;
            let axml = AxmlDocument::parse(&mut &file[..])?;

            axml.get_xml_string().to_owned()
        }
    };

    let mut printer = PrettyPrinter::new();
    printer.input_from_bytes(xml.as_bytes()).language("xml");

    if stdout_is_tty {
        printer.print().unwrap();
    } else {
        print!("{}", xml);
    }

    Ok(())
}
