// 🚀 Careers Registry - firm name → careers page
//
// Static lookup data, injected into the front end. The built-in table can
// be extended or overridden from a JSON object file ({"Firm": "https://..."}).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;

const DEFAULT_CAREER_PAGES: &[(&str, &str)] = &[
    // Prop shops & hedge funds
    ("Jane Street", "https://www.janestreet.com/join-jane-street/"),
    ("Citadel", "https://www.citadel.com/careers/"),
    ("Two Sigma", "https://www.twosigma.com/careers/"),
    ("D.E. Shaw Group", "https://www.deshaw.com/careers"),
    ("Jump Trading", "https://www.jumptrading.com/careers/"),
    ("Hudson River Trading", "https://www.hudsonrivertrading.com/careers/"),
    ("Optiver", "https://www.optiver.com/working-at-optiver/career-opportunities/"),
    ("Renaissance Technologies", "https://www.rentec.com/Careers.action"),
    ("AQR Capital Management", "https://careers.aqr.com/"),
    ("Millennium", "https://www.mlp.com/careers/"),
    ("Point72", "https://point72.com/students-early-career/"),
    ("Bridgewater", "https://www.bridgewater.com/careers"),
    ("Virtu Financial", "https://www.virtu.com/careers/"),
    ("Tower Research Capital", "https://www.tower-research.com/careers"),
    ("IMC Trading", "https://careers.imc.com/"),
    ("DRW", "https://drw.com/careers/"),
    ("Headlands Technologies", "https://www.headlandstech.com/#careers"),
    ("WorldQuant", "https://www.worldquant.com/careers/"),
    ("Schonfeld Strategic Advisors", "https://www.schonfeld.com/careers/"),
    ("Verition Fund Management", "https://www.verition.com/careers/"),
    ("Susquehanna International Group", "https://sig.com/careers/"),
    ("Akuna Capital", "https://akunacapital.com/careers"),
    ("XTX Markets", "https://www.xtxmarkets.com/careers/"),
    ("Flow Traders", "https://www.flowtraders.com/careers"),
    ("Belvedere Trading", "https://www.belvederetrading.com/careers/"),
    ("G-Research", "https://www.gresearch.co.uk/join-us/"),
    ("Squarepoint", "https://www.squarepoint-capital.com/careers"),
    ("Tibra Capital", "https://www.tibra.com/careers/"),
    ("Da Vinci", "https://davincitrading.com/careers/"),
    ("Wolverine Trading", "https://www.wolve.com/careers"),
    ("3Red Partners", "https://www.3redpartners.com/careers/"),
    ("Geneva Trading", "https://www.genevatrading.com/careers/"),
    ("Old Mission Capital", "https://www.oldmissioncapital.com/careers/"),
    ("Tradebot", "https://www.tradebot.com/careers"),
    ("Maven Securities", "https://www.mavensecurities.com/careers/"),
    ("Quantlab Financial", "https://www.quantlab.com/careers/"),
    ("TransMarket Group", "https://www.transmarketgroup.com/careers/"),
    ("XR Trading", "https://www.xrtrading.com/benefits"),
    ("FNY Capital", "https://www.fnycapital.com/careers/"),
    ("DV Trading", "https://dvtrading.co/join-dv/"),
    ("Radix Trading", "https://radixtrading.co/#careers"),
    // Quant asset managers
    ("Winton", "https://www.winton.com/opportunities"),
    ("Arrowstreet Capital", "https://www.arrowstreetcapital.com/professional-careers/"),
    // Global investment banks
    ("Goldman Sachs", "https://www.goldmansachs.com/careers/"),
    ("Morgan Stanley", "https://www.morganstanley.com/people-opportunities"),
    ("JPMorgan Chase", "https://careers.jpmorgan.com/"),
    ("Bank of America", "https://campus.bankofamerica.com/"),
    ("Citi", "https://jobs.citi.com/"),
    ("Barclays", "https://home.barclays/careers/"),
    ("Deutsche Bank", "https://careers.db.com/"),
    ("HSBC", "https://home.barclays/careers/"),
    // India
    ("Graviton Research Capital", "https://www.gravitontrading.com/careers.html"),
    ("WorldQuant India", "https://www.worldquant.com/careers/"),
    ("Tower Research Capital India", "https://www.tower-research.com/careers"),
    ("AlphaGrep Securities", "https://www.alpha-grep.com/career/"),
    ("Futures First", "https://www.futuresfirst.com/career/"),
    ("Edelweiss Group", "https://www.edelweissfin.com/careers"),
    ("HDFC Asset Management", "https://www.hdfcfund.com/about-us/careers"),
    ("Kotak Mahindra AMC", "https://www.kotakmf.com/careers"),
    ("State Bank of India", "https://bank.sbi/careers"),
    ("Zerodha", "https://zerodha.com/careers/"),
    ("Upstox", "https://upstox.com/careers"),
    ("Groww", "https://groww.in/careers"),
    ("Angel One", "https://www.angelone.in/careers/"),
    // South Africa
    ("RMB", "https://www.rmb.co.za/careers/"),
    ("Allan Gray", "https://www.allangray.co.za/careers/"),
    ("Coronation Fund Managers", "https://www.coronation.com/careers/"),
    ("Futuregrowth Asset Management", "https://www.futuregrowth.co.za/careers/"),
    ("Sygnia", "https://www.sygnia.co.za/careers/"),
    ("Old Mutual", "https://www.oldmutual.com/careers"),
    ("PSG", "https://www.psg.co.za/careers/"),
    ("Absa Group", "https://www.absa.africa/absaafrica/careers/"),
    ("Standard Bank Group", "https://www.standardbank.com/sbg/standard-bank-group/careers"),
    ("Discovery Limited", "https://www.discovery.co.za/corporate/careers"),
    ("Capitec", "https://www.capitecbank.co.za/about-us/careers/"),
    ("African Bank", "https://www.africanbank.co.za/en/home/about-us/careers/"),
    ("Sasfin", "https://www.sasfin.com/careers/"),
];

/// Careers page lookup by firm display name
#[derive(Debug, Clone, Default)]
pub struct CareerRegistry {
    pages: HashMap<String, String>,
}

impl CareerRegistry {
    /// Registry holding the built-in table
    pub fn new() -> Self {
        let mut registry = CareerRegistry::default();
        for (name, url) in DEFAULT_CAREER_PAGES {
            registry.register(*name, *url);
        }
        registry
    }

    pub fn empty() -> Self {
        CareerRegistry::default()
    }

    pub fn register(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.pages.insert(name.into(), url.into());
    }

    /// Merge a JSON object of name → URL over the current entries
    pub fn merge_json(&mut self, json: &str) -> Result<usize> {
        let extra: HashMap<String, String> = serde_json::from_str(json)?;
        let count = extra.len();
        self.pages.extend(extra);
        Ok(count)
    }

    /// Built-in table plus the entries from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let mut registry = CareerRegistry::new();
        let json = fs::read_to_string(path)?;
        let count = registry.merge_json(&json)?;
        info!(path = %path.display(), count, "Loaded careers table");
        Ok(registry)
    }

    /// Exact name first, then case-insensitive
    pub fn lookup(&self, firm_name: &str) -> Option<&str> {
        if let Some(url) = self.pages.get(firm_name) {
            return Some(url.as_str());
        }
        self.pages
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(firm_name))
            .map(|(_, url)| url.as_str())
    }

    pub fn count(&self) -> usize {
        self.pages.len()
    }
}
