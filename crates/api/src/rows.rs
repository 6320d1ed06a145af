//! Table bindings for companies, simulated leads and NPS analytics rows.

use weedle_core::columns::*;
use weedle_core::format::{format_api_date, format_currency, format_currency_whole, format_number, format_percent};
use weedle_core::{CellValue, Record};

use crate::dto::{Company, NpsAnalyticsRow, SimulatedLead};

fn money(v: f64) -> CellValue { CellValue::Markup(format_currency(v)) }

impl Record for Company {
    fn field(&self, key: &str) -> CellValue {
        match key {
            COMPANY_NAME => self.nome_empresa.as_str().into(),
            COMPANY_CNPJ => self.cnpj.as_str().into(),
            COMPANY_SEGMENT => self.segmento.as_str().into(),
            COMPANY_PRODUCT => self.produto.as_str().into(),
            COMPANY_CONTRACT_VALUE => money(self.valor_contrato),
            COMPANY_CLUSTER => self.cluster.as_str().into(),
            COMPANY_SIMULATED_AT => format_api_date(&self.data_simulacao).into(),
            COMPANY_ID => self.id.as_str().into(),
            COMPANY_EMAIL => self.email.as_str().into(),
            COMPANY_CAPITAL => money(self.capital_social),
            _ => CellValue::Empty,
        }
    }

    fn values(&self) -> Vec<CellValue> {
        [
            COMPANY_ID,
            COMPANY_NAME,
            COMPANY_CNPJ,
            COMPANY_SEGMENT,
            COMPANY_CAPITAL,
            COMPANY_EMAIL,
            COMPANY_PRODUCT,
            COMPANY_CONTRACT_VALUE,
            COMPANY_CLUSTER,
            COMPANY_SIMULATED_AT,
        ]
        .iter()
        .map(|k| self.field(k))
        .collect()
    }
}

impl Record for SimulatedLead {
    fn field(&self, key: &str) -> CellValue {
        match key {
            LEAD_CNPJ => self.cnpj.as_str().into(),
            LEAD_COMPANY => self.nome_empresa.as_str().into(),
            LEAD_SEGMENT => self.segmento.as_str().into(),
            LEAD_CAPITAL => money(self.capital_social),
            LEAD_EMAIL => self.email.as_str().into(),
            LEAD_PRODUCT => self.produto.as_str().into(),
            LEAD_CONTRACT_VALUE => money(self.valor_contrato),
            LEAD_CLUSTER => self.cluster_name.as_str().into(),
            LEAD_SIMULATED_AT => format_api_date(&self.data_simulacao).into(),
            _ => CellValue::Empty,
        }
    }

    fn values(&self) -> Vec<CellValue> {
        [LEAD_CNPJ, LEAD_COMPANY, LEAD_SEGMENT, LEAD_CAPITAL, LEAD_EMAIL, LEAD_PRODUCT, LEAD_CONTRACT_VALUE, LEAD_CLUSTER, LEAD_SIMULATED_AT]
            .iter()
            .map(|k| self.field(k))
            .collect()
    }
}

impl Record for NpsAnalyticsRow {
    fn field(&self, key: &str) -> CellValue {
        match key {
            NPS_CLIENT => self.cd_cliente.as_str().into(),
            NPS_SEGMENT => self.segmento.as_str().into(),
            NPS_SUBSEGMENT => self.subsegmento.as_str().into(),
            NPS_REVENUE_BAND => self.faixa_faturamento.as_str().into(),
            NPS_CONTRACT_STATUS => self.situacao_contrato.as_str().into(),
            NPS_CONTRACT_VALUE => CellValue::Markup(format_currency_whole(self.valor_total_contrato)),
            NPS_DISCOUNT => CellValue::Markup(format_percent(self.percentual_desconto, 2)),
            NPS_TICKET_RESOLUTION => self.media_resolucao_ticket.map(|d| format_number(d, 1)).into(),
            NPS_CLASSIFICATION => self.classificacao_nps.as_str().into(),
            NPS_AVG_SCORE => format_number(self.nota_media, 2).into(),
            _ => CellValue::Empty,
        }
    }

    fn values(&self) -> Vec<CellValue> {
        [
            NPS_CLIENT,
            NPS_SEGMENT,
            NPS_SUBSEGMENT,
            NPS_REVENUE_BAND,
            NPS_CONTRACT_STATUS,
            NPS_CONTRACT_VALUE,
            NPS_DISCOUNT,
            NPS_TICKET_RESOLUTION,
            NPS_CLASSIFICATION,
            NPS_AVG_SCORE,
        ]
        .iter()
        .map(|k| self.field(k))
        .collect()
    }
}
